//! 规则引擎集成测试
//!
//! 测试完整的规则编译、缓存、执行工作流，以及属性解析、记录比较与 schema 描述。

use rule_engine::record::Record;
use rule_engine::{Datum, RuleEngine, Tuple, Value};
use serde_json::json;

/// 创建测试记录：一笔交易
fn create_trade_record() -> Tuple {
    Tuple::new()
        .with("symbol", "INTC")
        .with("price", 79.25)
        .with("quantity", 1287)
}

/// 创建测试记录：包含嵌套元组、集合与列表
fn create_rich_record() -> Tuple {
    let plane = Tuple::new().with("airliner", "A380").with("seats", 853);
    let employee = Tuple::new()
        .with("name", "Ada")
        .with("skills", Datum::set(["C++", "Java", "Python", "SPL"]));

    Tuple::new()
        .with("a", "hi")
        .with("b", "wxyzq")
        .with("g", vec![1, 2, 3, 4, 5, 6, 7, 8])
        .with("id", 11)
        .with("transport", Tuple::new().with("plane", plane))
        .with("employee", employee)
        .with(
            "k",
            vec![
                Tuple::new().with("n", 1).with("label", "first"),
                Tuple::new().with("n", 2).with("label", "second"),
            ],
        )
        .with("m", Datum::map([("x", 10), ("y", 20)]))
}

#[test]
fn test_trade_rule_not_matched() {
    let mut engine = RuleEngine::default();
    let record = create_trade_record();

    let result = engine.evaluate(
        "(symbol == 'INTC' && price > 698.56 && quantity == 7492)",
        &record,
        false,
    );

    assert_eq!(result.error_code(), 0);
    assert!(!result.matched);
}

#[test]
fn test_mixed_operators_rule_not_matched() {
    let mut engine = RuleEngine::default();
    let record = create_rich_record();

    let result = engine.evaluate(
        "a == 'hi' && b contains 'xyz' && g[4] > 6.7 && id % 8 == 3",
        &record,
        false,
    );

    assert_eq!(result.error_code(), 0);
    assert!(!result.matched);

    // g[4] == 5，调整阈值后整条规则成立
    let result = engine.evaluate(
        "a == 'hi' && b contains 'xyz' && g[4] > 4.5 && id % 8 == 3",
        &record,
        false,
    );
    assert_eq!(result.error_code(), 0);
    assert!(result.matched);
}

#[test]
fn test_resolve_set_attribute() {
    let engine = RuleEngine::default();
    let record = create_rich_record();

    let value = engine
        .resolve_attribute("employee.skills", &record, false)
        .unwrap();

    assert_eq!(
        value,
        Value::Set(vec![
            Value::str("C++"),
            Value::str("Java"),
            Value::str("Python"),
            Value::str("SPL"),
        ])
    );
}

#[test]
fn test_resolve_nested_paths() {
    let engine = RuleEngine::default();
    let record = create_rich_record();

    let value = engine
        .resolve_attribute("transport.plane.airliner", &record, false)
        .unwrap();
    assert_eq!(value, Value::str("A380"));

    let value = engine.resolve_attribute("k[1].label", &record, false).unwrap();
    assert_eq!(value, Value::str("second"));

    let value = engine.resolve_attribute("m['y']", &record, false).unwrap();
    assert_eq!(value, Value::Int(20));

    let err = engine
        .resolve_attribute("transport.boat", &record, false)
        .unwrap_err();
    assert_eq!(err.code(), 301);
}

#[test]
fn test_compare_records() {
    let engine = RuleEngine::default();
    let left = Tuple::new()
        .with("a", 1)
        .with("b", "same")
        .with("c", vec![1, 2])
        .with("d", Tuple::new().with("x", true))
        .with("f", 2.5);
    let right = Tuple::new()
        .with("a", 2)
        .with("b", "same")
        .with("c", vec![1, 2])
        .with("d", Tuple::new().with("x", true))
        .with("f", 3.5);

    let comparison = engine.compare_records(&left, &right, false).unwrap();

    assert_eq!(comparison.differing, vec!["a", "f"]);
    assert_eq!(comparison.matching, vec!["b", "c", "d.x"]);
    assert!(!comparison.matching.iter().any(|p| p == "a" || p == "f"));
}

#[test]
fn test_unbalanced_rule_not_cached() {
    let mut engine = RuleEngine::default();
    let record = create_trade_record();

    let result = engine.evaluate("(symbol == 'INTC'))", &record, false);

    assert_eq!(result.error_code(), 201);
    assert!(!engine.cache().contains("(symbol == 'INTC'))"));
    assert!(engine.cache().is_empty());
}

#[test]
fn test_division_by_zero() {
    let mut engine = RuleEngine::default();
    let record = create_rich_record();

    let result = engine.evaluate("id % 0 == 3", &record, false);

    assert_eq!(result.error_code(), 403);
    // 编译成功，规则仍被缓存
    assert!(engine.cache().contains("id % 0 == 3"));
}

#[test]
fn test_evaluation_is_idempotent() {
    let mut engine = RuleEngine::default();
    let record = create_rich_record();
    let rule = "(a == 'hi' || k[0].n > 5) && employee.skills contains 'SPL'";

    let first = engine.evaluate(rule, &record, false);
    let second = engine.evaluate(rule, &record, false);

    assert_eq!(first.matched, second.matched);
    assert_eq!(first.error_code(), second.error_code());
    assert!(first.matched);
    assert!(!first.cache_hit);
    assert!(second.cache_hit);
}

#[test]
fn test_cached_tree_is_record_independent() {
    let mut engine = RuleEngine::default();
    let rule = "quantity > 1000";

    let big = create_trade_record();
    let small = Tuple::new().with("quantity", 10);

    assert!(engine.try_evaluate(rule, &big).unwrap());
    assert!(!engine.try_evaluate(rule, &small).unwrap());
    assert_eq!(engine.cache_stats().entries, 1);
}

#[test]
fn test_contexts_do_not_share_cache() {
    let mut first = RuleEngine::default();
    let mut second = RuleEngine::default();
    let record = create_trade_record();

    first.evaluate("price < 100", &record, false);
    let result = second.evaluate("price < 100", &record, false);

    assert!(!result.cache_hit);
    assert_eq!(first.cache_stats().entries, 1);
    assert_eq!(second.cache_stats().entries, 1);
}

#[test]
fn test_uniformity() {
    let mut engine = RuleEngine::default();
    let record = create_trade_record();

    let ok = engine.evaluate("(price > 1 || quantity < 2) && symbol == 'INTC'", &record, false);
    assert_eq!(ok.error_code(), 0);
    assert!(ok.matched);

    let mixed = engine.evaluate("price > 1 || quantity < 2 && symbol == 'INTC'", &record, false);
    assert_eq!(mixed.error_code(), 203);
}

#[test]
fn test_case_insensitive_verbs() {
    let mut engine = RuleEngine::default();
    let record = Tuple::new().with("name", "ABC").with("city", "Zürich");

    assert!(engine.try_evaluate("name equalsCI 'abc'", &record).unwrap());
    assert!(!engine.try_evaluate("name == 'abc'", &record).unwrap());
    assert!(engine.try_evaluate("city startsWithCI 'zü'", &record).unwrap());
    assert!(engine.try_evaluate("city inCI ['ZÜRICH', 'Bern']", &record).unwrap());
    assert!(engine.try_evaluate("city notEqualsCI 'Bern'", &record).unwrap());
}

#[test]
fn test_size_verbs() {
    let mut engine = RuleEngine::default();
    let record = create_rich_record();

    for n in 0..10 {
        let expected = 8 == n;
        let rule = format!("g sizeEQ {}", n);
        assert_eq!(engine.try_evaluate(&rule, &record).unwrap(), expected, "{}", rule);
    }
    assert!(engine.try_evaluate("employee.skills sizeGE 4 && m sizeLT 3", &record).unwrap());
}

#[test]
fn test_json_record() {
    let mut engine = RuleEngine::default();
    let value = json!({
        "event": {"type": "PURCHASE", "source": "mobile_app"},
        "order": {"amount": 1500, "items": [{"sku": "TICKET-001", "price": 500}]},
        "user": {"level": "gold", "tags": ["frequent_visitor", "annual_pass"]},
        "note": null
    });
    let serde_json::Value::Object(record) = value else {
        panic!("expected object");
    };

    let rule = "event.type == 'PURCHASE' && order.amount >= 1000 && \
                order.items[0].price * 2 == 1000 && user.tags contains 'annual_pass'";
    assert!(engine.try_evaluate(rule, &record).unwrap());

    // null 属性视为不存在
    let err = engine.try_evaluate("note == 'x'", &record).unwrap_err();
    assert_eq!(err.code(), 301);

    // 含 null 元素的数组整体不可读，下标与 size 不会错位
    let holes = json!({"g": [1, null, 3]});
    let serde_json::Value::Object(holes) = holes else {
        panic!("expected object");
    };
    assert_eq!(engine.evaluate("g[1] == 3", &holes, false).error_code(), 301);
    assert_eq!(engine.evaluate("g sizeEQ 3", &holes, false).error_code(), 301);

    let schema = engine.describe_schema(&record);
    assert_eq!(schema.attribute_types.get("order.amount").map(String::as_str), Some("int64"));
    assert!(!schema.attribute_types.contains_key("note"));
}

#[test]
fn test_describe_schema() {
    let engine = RuleEngine::default();
    let record = create_trade_record();

    let schema = engine.describe_schema(&record);

    assert_eq!(
        schema.schema_literal,
        "tuple<rstring symbol,float64 price,int64 quantity>"
    );
    assert_eq!(schema.schema_literal, record.schema());
}

#[test]
fn test_error_code_ranges() {
    let mut engine = RuleEngine::default();
    let record = create_rich_record();

    let cases = [
        ("a == 'unterminated", 101),
        ("a = 'hi'", 102),
        ("a equals 'hi'", 204),
        ("a ==", 208),
        ("missing == 1", 301),
        ("g[99] == 1", 302),
        ("m['z'] == 1", 303),
        ("employee.skills[0] == 'C++'", 304),
        ("a > 1", 401),
        ("employee.skills > employee.skills", 402),
        ("id * 9223372036854775807 > 0", 404),
    ];

    for (rule, code) in cases {
        let result = engine.evaluate(rule, &record, false);
        assert_eq!(result.error_code(), code, "rule {:?}", rule);
    }
}

#[test]
fn test_debug_trace() {
    let mut engine = RuleEngine::default();
    let record = create_rich_record();

    let result = engine.evaluate("a == 'no' || id % 8 == 3", &record, true);

    assert!(result.matched);
    assert!(result.evaluation_trace.iter().any(|line| line.contains("OR 短路")));
}
