//! Purpose: Exercise typed node accessors against a realistic YAML document.
//! Exports: Integration tests only.
//! Role: Lock predicate, nested-map, list, and conversion behavior seen by callers.
//! Invariants: Negated predicates treat absent containers as satisfying the negation.
//! Invariants: Nested maps read twice are the same handle, and edits through it stay visible.

use std::collections::BTreeMap;

use docmap::api::{
    Error, ErrorKind, Instant, Mapper, Node, NodeList, Registry, Shape, Target, Value,
};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const CARS: &str = include_str!("fixtures/cars.yml");
const PERSONS: &str = include_str!("fixtures/person.yml");
const NAME: &str = "Hans Dietrich Genscher";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    name: String,
    member_since: Instant,
}

#[derive(Clone, Debug)]
struct Member(Node);

impl Shape for Member {
    const NAME: &'static str = "Member";

    fn from_node(node: Node) -> Self {
        Self(node)
    }

    fn node(&self) -> &Node {
        &self.0
    }
}

impl Member {
    fn name(&self, registry: &Registry) -> Result<Option<String>, Error> {
        self.0.get_as_string(registry, "name")
    }

    fn member_since(&self, registry: &Registry) -> Result<Option<Instant>, Error> {
        self.0.get_as(registry, "memberSince")
    }
}

fn cars(mapper: &Mapper) -> NodeList {
    init_tracing();
    let root: Node = mapper.read_yaml(CARS).expect("read cars");
    root.get_as_list(mapper.registry(), "cars")
        .expect("cars list")
        .expect("cars present")
}

fn person_document(mapper: &Mapper, member_since: Instant) -> Node {
    let mut people = BTreeMap::new();
    people.insert(
        "person",
        Person {
            name: NAME.to_string(),
            member_since,
        },
    );
    mapper.write_value_as_map(&people).expect("write as map")
}

#[test]
fn nested_map_can_be_read_and_edited() {
    let mapper = Mapper::new();
    let registry = mapper.registry();
    let since = Instant::now();
    let root = person_document(&mapper, since);

    let person = root.get_as_map(registry, "person").expect("map").expect("person");
    assert_eq!(
        person.get_as_string(registry, "name").expect("name").as_deref(),
        Some(NAME)
    );
    let text = person
        .get_as_string(registry, "memberSince")
        .expect("since")
        .expect("present");
    assert_eq!(text.parse::<Instant>().expect("instant"), since);

    person.put("name", "Egon Müller");
    let again = root.get_as_map(registry, "person").expect("map").expect("person");
    assert!(again.ptr_eq(&person));
    assert_eq!(
        again.get_as_string(registry, "name").expect("name").as_deref(),
        Some("Egon Müller")
    );
}

#[test]
fn specific_shape_exposes_typed_getters() {
    let mapper = Mapper::new();
    let registry = mapper.registry();
    let since = Instant::now();
    let root = person_document(&mapper, since);

    let member = root
        .get_as_map_of::<Member>(registry, "person")
        .expect("member")
        .expect("present");
    assert_eq!(member.name(registry).expect("name").as_deref(), Some(NAME));
    assert_eq!(member.member_since(registry).expect("since"), Some(since));

    let again = root
        .get_as_map_of::<Member>(registry, "person")
        .expect("member")
        .expect("present");
    assert!(again.node().ptr_eq(member.node()));
}

#[test]
fn list_entries_can_be_edited_and_appended() {
    let mapper = Mapper::new();
    let registry = mapper.registry();
    let root: Node = mapper.read_yaml(PERSONS).expect("read persons");

    let persons = root.get_as_list(registry, "persons").expect("list").expect("persons");
    persons.get(0).expect("first").put("x", "y");
    let first = root
        .get_as_list(registry, "persons")
        .expect("list")
        .expect("persons")
        .get(0)
        .expect("first");
    assert_eq!(first.get_as_string(registry, "x").expect("x").as_deref(), Some("y"));

    let extra = Node::new();
    extra.put("x", "x");
    persons.push(extra);
    assert_eq!(
        root.get_as_list(registry, "persons").expect("list").expect("persons").len(),
        3
    );
}

#[test]
fn numbers_convert_across_widths() {
    let mapper = Mapper::new();
    let registry = mapper.registry();
    let map: Node = mapper.read_json(r#"{"a": 1234, "s": "1234.0"}"#).expect("read");

    assert_eq!(map.get_as::<i32>(registry, "a").expect("i32"), Some(1234));
    assert_eq!(map.get_as::<i64>(registry, "a").expect("i64"), Some(1234));
    assert_eq!(map.get_as::<f64>(registry, "a").expect("f64"), Some(1234.0));
    assert_eq!(
        map.get_as::<BigInt>(registry, "a").expect("bigint"),
        Some(BigInt::from(1234))
    );
    assert_eq!(map.get_as::<f64>(registry, "s").expect("f64"), Some(1234.0));
    assert_eq!(map.get_as::<f64>(registry, "missing").expect("null"), None);
}

#[test]
fn missing_converter_reports_registrations() {
    struct Reader;

    impl Target for Reader {
        fn type_name() -> &'static str {
            "Reader"
        }

        fn cast(_value: &Value) -> Option<Self> {
            None
        }
    }

    let mapper = Mapper::new();
    let map: Node = mapper.read_json(r#"{"a": "true"}"#).expect("read");
    let err = map.get_as::<Reader>(mapper.registry(), "a").err().expect("refused");
    assert_eq!(err.kind(), ErrorKind::Conversion);
    let text = err.to_string();
    assert!(text.contains("Converter missing"));
    assert!(text.contains("string with value=true cannot be converted to Reader"));
    assert!(text.contains("Converters are registered for BigDecimal, BigInt, Date"));
}

#[test]
fn nested_documents_refuse_scalar_targets() {
    fn assert_refused<T: Target + std::fmt::Debug>(root: &Node, registry: &Registry) {
        let err = root.get_as::<T>(registry, "person").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        let text = err.to_string();
        assert!(text.contains("Node with value="), "{text}");
        assert!(
            text.contains(&format!(" cannot be converted to {}", T::type_name())),
            "{text}"
        );
    }

    let mapper = Mapper::new();
    let registry = mapper.registry();
    let root = person_document(&mapper, Instant::now());
    assert_refused::<bool>(&root, registry);
    assert_refused::<i32>(&root, registry);
    assert_refused::<i64>(&root, registry);
    assert_refused::<f64>(&root, registry);
    assert_refused::<BigInt>(&root, registry);
    assert_refused::<bigdecimal::BigDecimal>(&root, registry);
    assert_refused::<time::Date>(&root, registry);
    assert_refused::<Instant>(&root, registry);
}

#[test]
fn boolean_and_value_predicates() {
    let mapper = Mapper::new();
    let cars = cars(&mapper);
    let audi = cars.get(0).expect("audi");
    assert_eq!(cars.find("name", "audi").expect("audi").get("metallic"), Some(Value::Bool(true)));
    assert!(audi.is("metallic"));
    assert!(!audi.is("nicht in der map"));
    assert!(audi.is_value("color", "red"));
    assert!(audi.is_value_with("color", "pale blue", false));
}

#[test]
fn map_predicates_on_nested_maps() {
    let mapper = Mapper::new();
    let registry = mapper.registry();
    let audi = cars(&mapper).get(0).expect("audi");

    assert!(audi.map_contains_key(registry, "translation", "1").expect("key"));
    assert!(!audi.map_contains_key(registry, "translation", "4").expect("key"));
    assert!(!audi.map_contains_key(registry, "not a valid key", "1").expect("key"));
    assert!(
        audi.map_contains_key_with(registry, "translation", "1z", false)
            .expect("key")
    );
    assert!(
        audi.map_contains_key_with(registry, "not a valid key", "1z", false)
            .expect("key")
    );

    assert!(audi.map_contains_value(registry, "translation", "eins").expect("value"));
    assert!(!audi.map_contains_value(registry, "translation", "vier").expect("value"));
    assert!(!audi.map_contains_value(registry, "not a valid key", "eins").expect("value"));
    assert!(
        audi.map_contains_value_with(registry, "translation", "bingo", false)
            .expect("value")
    );
    assert!(
        audi.map_contains_value_with(registry, "not a valid key", "bingo", false)
            .expect("value")
    );

    assert_eq!(
        audi.get_map_value(registry, "translation", "1").expect("value"),
        Some(Value::from("eins"))
    );
    assert_eq!(audi.get_map_value(registry, "translation", "4").expect("value"), None);
    assert_eq!(audi.get_map_value(registry, "ralf", "1").expect("value"), None);
}

#[test]
fn list_predicates_on_nested_lists() {
    let mapper = Mapper::new();
    let registry = mapper.registry();
    let audi = cars(&mapper).get(0).expect("audi");
    assert!(audi.list_contains(registry, "extras", "tire").expect("list"));
    assert!(!audi.list_contains(registry, "extras", "mirror").expect("list"));
    assert!(
        audi.list_contains_with(registry, "extras", "hustensaft", false)
            .expect("list")
    );
    assert!(!audi.list_contains(registry, "not a valid key", "tire").expect("list"));
}

#[test]
fn cars_can_be_filtered_by_predicates() {
    let mapper = Mapper::new();
    let registry = mapper.registry();
    let mut matches = Vec::new();
    for car in cars(&mapper).nodes() {
        let keep = car.list_contains(registry, "extras", "tire").expect("extras")
            && car.map_contains_key(registry, "translation", "1").expect("key")
            && car
                .map_contains_value(registry, "translation", "nonsense")
                .expect("value")
            && car.is("metallic")
            && car.is_value("color", "pale blue")
            && car
                .get_as::<Vec<Value>>(registry, "extras")
                .expect("extras")
                .is_some_and(|extras| extras.contains(&Value::from("horn")));
        if keep {
            matches.push(car);
        }
    }
    assert_eq!(matches.len(), 1);
    let toyota = &matches[0];
    assert_eq!(
        toyota.get_as_string(registry, "name").expect("name").as_deref(),
        Some("toyota")
    );
    assert_eq!(
        toyota.get_as::<BigInt>(registry, "price").expect("price"),
        Some(BigInt::from(370_000_000_000_000_000_i64))
    );
}

#[test]
fn chained_map_navigation() {
    let mapper = Mapper::new();
    let registry = mapper.registry();
    let mercedes = cars(&mapper).find("name", "mercedes").expect("mercedes");
    let maps = mercedes.get_as_map(registry, "mapOfMaps").expect("maps").expect("present");
    assert!(maps.contains_key("map1"));
    assert!(maps.map_contains_value(registry, "map2", "X").expect("value"));
    assert!(
        maps.map_contains_value_with(registry, "map2", "U", false)
            .expect("value")
    );
    assert!(mercedes.map_contains_key_with(registry, "mapOfMaps", "map3", false).expect("key"));
    assert_eq!(
        maps.get_map_value(registry, "map1", "b").expect("value"),
        Some(Value::from("B"))
    );
    let map1 = mercedes.get_map_value(registry, "mapOfMaps", "map1").expect("value");
    assert!(matches!(map1, Some(Value::Node(ref node)) if node.contains_key("a")));
    assert!(
        mercedes
            .get_as::<i64>(registry, "price")
            .expect("price")
            .is_some_and(|price| price >= 10_000_000_000)
    );
}
