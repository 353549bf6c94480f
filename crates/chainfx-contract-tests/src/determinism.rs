#[cfg(test)]
mod tests {
    use chainfx_core::EngineError;
    use chainfx_graph::{FilterType, Graph};
    use chainfx_runtime_glow::Builder;

    /// Determinism contract:
    /// compiling the same graph twice yields the same chain ordering.
    #[test]
    fn graph_compile_is_deterministic_for_same_graph() {
        let mut g = Graph::new();

        let input = g.add_node(FilterType::Input, "in").expect("add in");
        let blur = g.add_node(FilterType::GaussianBlur, "blur").expect("add blur");
        let out = g.add_node(FilterType::Output, "out").expect("add out");

        g.connect(input, blur).expect("connect in -> blur");
        g.connect(blur, out).expect("connect blur -> out");

        let p1 = g.compile(&[input]).expect("compile 1");
        let p2 = g.compile(&[input]).expect("compile 2");

        assert_eq!(p1.chains, p2.chains, "chain order must be stable");
        assert_eq!(p1.chains[0], vec![input, blur, out]);
    }

    /// Declaration order of filters does not affect the chain; only connections do.
    #[test]
    fn builder_order_follows_connections_not_declarations() {
        const SHUFFLED: &str = r#"{
            "filters": [
                { "type": "Output", "name": "out", "params": { "format": "buffer" } },
                { "type": "Brightness", "name": "b" },
                { "type": "Input", "name": "in", "params": { "format": "pixelMap" } }
            ],
            "connections": [ { "from": "b", "to": "out" }, { "from": "in", "to": "b" } ]
        }"#;

        let chain = Builder::try_create_from_str(SHUFFLED).expect("build");
        let names: Vec<&str> = chain.plan().expect("plan").chains[0]
            .iter()
            .map(|id| chain.filters().name(*id).expect("name"))
            .collect();
        assert_eq!(names, ["in", "b", "out"]);
    }

    #[test]
    fn cycles_are_rejected_at_compile() {
        let mut g = Graph::new();
        let input = g.add_node(FilterType::Input, "in").expect("add in");
        let a = g.add_node(FilterType::Contrast, "a").expect("add a");
        let b = g.add_node(FilterType::Saturation, "b").expect("add b");
        g.connect(input, a).expect("in -> a");
        g.connect(a, b).expect("a -> b");
        g.connect(b, a).expect("b -> a");

        let err = g.compile(&[input]);
        assert!(matches!(err, Err(EngineError::Other(_))), "got: {err:?}");
    }
}
