use samyama_wrappers::graph::{
    Direction, EdgeElement, Element, Features, GraphError, Id, MemoryGraph, PropertyGraph,
    PropertyValue,
};
use samyama_wrappers::{
    BatchConfig, BatchGraph, DispatchMode, EventConfig, EventGraph, GraphChangedListener, IdGraph,
    WrapperConfig,
};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

/// Records the element IDs it is told about
struct Recorder {
    log: Log,
}

impl<V: Element, E: EdgeElement> GraphChangedListener<V, E> for Recorder {
    fn vertex_added(&mut self, vertex: &V) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("+v {}", vertex.id()));
        Ok(())
    }

    fn edge_added(&mut self, edge: &E) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("+e {} {}", edge.id(), edge.label()));
        Ok(())
    }

    fn vertex_property_changed(
        &mut self,
        vertex: &V,
        key: &str,
        _old_value: Option<&PropertyValue>,
        new_value: &PropertyValue,
    ) -> anyhow::Result<()> {
        self.log
            .borrow_mut()
            .push(format!("v {} {}={}", vertex.id(), key, new_value));
        Ok(())
    }
}

/// Fails on the first vertex, accepts everything after
struct FailsOnce {
    failed: bool,
}

impl<V: Element, E: EdgeElement> GraphChangedListener<V, E> for FailsOnce {
    fn vertex_added(&mut self, _vertex: &V) -> anyhow::Result<()> {
        if !self.failed {
            self.failed = true;
            anyhow::bail!("transient");
        }
        Ok(())
    }
}

struct Rejecting;

impl<V: Element, E: EdgeElement> GraphChangedListener<V, E> for Rejecting {
    fn edge_added(&mut self, _edge: &E) -> anyhow::Result<()> {
        anyhow::bail!("edges are not allowed")
    }
}

fn native_transactional() -> MemoryGraph {
    MemoryGraph::with_features(Features {
        supports_vertex_ids: false,
        supports_edge_ids: false,
        supports_transactions: true,
    })
}

#[test]
fn test_listener_above_id_layer_sees_external_ids() {
    let log = Log::default();
    let mut graph = EventGraph::new(IdGraph::new(MemoryGraph::native_ids()));
    graph.add_listener(Recorder { log: log.clone() });

    let a = graph.add_vertex(Some("alice".into())).unwrap();
    let b = graph.add_vertex(Some("bob".into())).unwrap();
    graph.add_edge(Some("k1".into()), &a, &b, "knows").unwrap();
    graph.set_vertex_property(&a, "age", 30i64.into()).unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["+v alice", "+v bob", "+e k1 knows", "v alice age=30"]
    );
}

#[test]
fn test_listener_below_id_layer_sees_native_ids() {
    let log = Log::default();
    let mut events = EventGraph::new(MemoryGraph::native_ids());
    events.add_listener(Recorder { log: log.clone() });
    let mut graph = IdGraph::new(events);

    let a = graph.add_vertex(Some("alice".into())).unwrap();
    assert_eq!(a.id(), &Id::from("alice"));

    let native = a.base().id().to_string();
    assert_eq!(*log.borrow(), vec![format!("+v {}", native)]);
    assert_ne!(native, "alice");
}

#[test]
fn test_bulk_load_with_deferred_events() {
    let log = Log::default();
    let events_config = EventConfig {
        dispatch: DispatchMode::Deferred,
    };
    let mut events = EventGraph::with_config(native_transactional(), &events_config).unwrap();
    events.add_listener(Recorder { log: log.clone() });

    let mut loader = BatchGraph::new(events);
    loader.add_edge_by_ids(None, &"A".into(), &"B".into(), "knows").unwrap();
    loader.add_edge_by_ids(None, &"A".into(), &"C".into(), "knows").unwrap();

    assert!(log.borrow().is_empty());
    assert_eq!(loader.graph().base().pending_events(), 5);

    loader.notify_transaction_boundary().unwrap();
    assert_eq!(loader.graph().base().pending_events(), 0);

    let recorded = log.borrow();
    assert_eq!(recorded.len(), 5);
    assert_eq!(recorded.iter().filter(|line| line.starts_with("+v")).count(), 3);
    assert_eq!(recorded.iter().filter(|line| line.ends_with("knows")).count(), 2);
}

#[test]
fn test_listener_failure_surfaces_through_loader() {
    let mut events = EventGraph::new(MemoryGraph::native_ids());
    events.add_listener(Rejecting);

    let mut loader = BatchGraph::new(events);
    let result = loader.add_edge_by_ids(None, &"A".into(), &"B".into(), "knows");
    assert!(matches!(result, Err(GraphError::Listener { .. })));

    // the edge itself was stored before the listener ran
    let a = loader.get_vertex(&"A".into()).unwrap().unwrap();
    assert_eq!(loader.vertex_edges(&a, Direction::Out, &[]).unwrap().len(), 1);
}

#[test]
fn test_retry_after_listener_failure_reuses_vertex() {
    let mut events = EventGraph::new(MemoryGraph::native_ids());
    events.add_listener(FailsOnce { failed: false });
    let mut loader = BatchGraph::new(events);

    let first = loader.get_or_create_vertex(&"A".into());
    assert!(matches!(first, Err(GraphError::Listener { .. })));

    let second = loader.get_or_create_vertex(&"A".into()).unwrap();
    assert_eq!(second.id(), &Id::from("A"));
    loader.add_edge_by_ids(None, &"A".into(), &"B".into(), "knows").unwrap();

    assert_eq!(loader.graph().base().base().vertex_count(), 2);
    assert_eq!(loader.stats().vertices_created, 2);
}

#[test]
fn test_rolled_back_ids_can_be_reused() {
    let mut graph = IdGraph::new(native_transactional());
    graph.add_vertex(Some("a".into())).unwrap();
    graph.rollback().unwrap();

    assert!(graph.get_vertex(&"a".into()).unwrap().is_none());
    let a = graph.add_vertex(Some("a".into())).unwrap();
    graph.commit().unwrap();
    assert_eq!(graph.get_vertex(&"a".into()).unwrap().unwrap(), a);
}

#[test]
fn test_query_through_loader() {
    let mut loader = BatchGraph::new(native_transactional());
    for (tail, head, weight) in [("A", "B", 1i64), ("A", "C", 5), ("A", "D", 5), ("B", "A", 2)] {
        let edge = loader
            .add_edge_by_ids(None, &tail.into(), &head.into(), "knows")
            .unwrap();
        loader.set_edge_property(&edge, "weight", weight.into()).unwrap();
    }
    loader.notify_transaction_boundary().unwrap();

    let a = loader.get_vertex(&"A".into()).unwrap().unwrap();
    let heavy = loader
        .query(&a)
        .direction(Direction::Out)
        .labels(["knows"])
        .has("weight", 5i64)
        .vertices(&loader)
        .unwrap();
    let ids: Vec<String> = heavy.iter().map(|v| v.id().to_string()).collect();
    assert_eq!(ids, vec!["C", "D"]);

    assert_eq!(loader.query(&a).count(&loader).unwrap(), 4);
    assert_eq!(loader.query(&a).limit(2).vertices(&loader).unwrap().len(), 2);
}

#[test]
fn test_stack_from_yaml_config() {
    let config = WrapperConfig::from_yaml_str(
        "batch:\n  compression: url\n  buffer_size: 2\n  vertex_id_key: uri\nevents:\n  dispatch: deferred\n",
    )
    .unwrap();

    let log = Log::default();
    let mut events = EventGraph::with_config(native_transactional(), &config.events).unwrap();
    events.add_listener(Recorder { log: log.clone() });
    let mut loader = BatchGraph::with_config(events, config.batch.clone()).unwrap();

    loader
        .add_edge_by_ids(None, &"http://x.org/a".into(), &"http://x.org/b".into(), "links")
        .unwrap();
    loader.shutdown().unwrap();

    assert_eq!(loader.config(), &config.batch);
    let a = loader.get_vertex(&"http://x.org/a".into()).unwrap().unwrap();
    assert_eq!(
        loader.vertex_property(&a, "uri").unwrap(),
        Some(PropertyValue::from("http://x.org/a"))
    );
    // two vertex adds, two id properties, one edge
    assert_eq!(log.borrow().len(), 5);
}

#[test]
fn test_deferred_events_rejected_without_transactions() {
    let config = EventConfig {
        dispatch: DispatchMode::Deferred,
    };
    let result = EventGraph::with_config(MemoryGraph::new(), &config);
    assert!(matches!(result, Err(GraphError::Config(_))));

    let invalid = BatchConfig {
        vertex_id_key: Some(String::new()),
        ..BatchConfig::default()
    };
    assert!(matches!(
        BatchGraph::with_config(MemoryGraph::new(), invalid),
        Err(GraphError::Config(_))
    ));
}
