use std::cell::RefCell;
use std::rc::Rc;

use cfg_broker::prelude::*;

#[test]
fn test_default_seeds_value_without_preset() {
    let broker = Broker::new();
    let param = broker.create_param("top.rate", 5i64).build().unwrap();
    assert_eq!(param.get_value(), 5);
    assert!(param.is_default_value());
}

#[test]
fn test_set_then_get_round_trips() {
    let broker = Broker::new();
    let param = broker.create_param("top.rate", 0i64).build().unwrap();
    assert!(param.set_value(42));
    assert_eq!(param.get_value(), 42);
    assert!(!param.is_default_value());
}

#[test]
fn test_preset_overrides_default_and_is_consumed() {
    let broker = Broker::new();
    broker
        .set_preset_value("x", Value::Int(10), Originator::new("origA"))
        .unwrap();

    let param = broker.create_param("x", 5i64).build().unwrap();
    assert_eq!(param.get_value(), 10);
    assert_eq!(param.value_origin().name(), "origA");
    assert!(broker.unconsumed_preset_values().is_empty());
}

#[test]
fn test_locked_preset_rejects_later_set() {
    let broker = Broker::new();
    broker
        .set_preset_value("x", Value::Int(10), Originator::new("origA"))
        .unwrap();
    broker.lock_preset_value("x");

    let err = broker
        .set_preset_value("x", Value::Int(20), Originator::new("origB"))
        .unwrap_err();
    assert_eq!(err, CfgError::AlreadyLocked("x".to_string()));
    assert_eq!(broker.get_preset_value("x"), Some(Value::Int(10)));
    assert_eq!(broker.preset_value_origin("x").unwrap().name(), "origA");
}

#[test]
fn test_unconsumed_report_and_ignore_predicates() {
    let broker = Broker::new();
    broker
        .set_preset_value("z", Value::Int(1), Originator::unknown())
        .unwrap();
    broker
        .set_preset_value("debug.trace", Value::Bool(true), Originator::unknown())
        .unwrap();

    let names: Vec<String> = broker
        .unconsumed_preset_values()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["debug.trace".to_string(), "z".to_string()]);

    broker.ignore_unconsumed_presets(|name, _| name.starts_with("debug."));
    let names: Vec<String> = broker
        .unconsumed_preset_values()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["z".to_string()]);
    // Ignoring filters the report only; the entry itself stays unconsumed.
    assert!(broker.has_preset_value("debug.trace"));
}

#[test]
fn test_name_collision_resolves_to_distinct_names() {
    let broker = Broker::new();
    let first = broker.create_param("a", 1i64).build().unwrap();
    let second = broker.create_param("a", 2i64).build().unwrap();

    assert_eq!(first.name(), "a");
    assert_ne!(second.name(), "a");
    assert!(broker.has_param(first.name()));
    assert!(broker.has_param(second.name()));
    assert_eq!(broker.get_value::<i64>(second.name()).unwrap(), 2);
}

#[test]
fn test_name_released_after_destruction() {
    let broker = Broker::new();
    {
        let param = broker.create_param("a", 1i64).build().unwrap();
        assert_eq!(param.name(), "a");
    }
    let again = broker.create_param("a", 2i64).build().unwrap();
    assert_eq!(again.name(), "a");
}

#[test]
fn test_unparseable_preset_falls_back_to_default_and_stays_unconsumed() {
    let broker = Broker::new();
    broker
        .set_preset_value("x", Value::Str("not a number".into()), Originator::unknown())
        .unwrap();

    let param = broker.create_param("x", 5i64).build().unwrap();
    assert_eq!(param.get_value(), 5);
    let unconsumed = broker.unconsumed_preset_values();
    assert_eq!(unconsumed.len(), 1);
    assert_eq!(unconsumed[0].0, "x");
}

#[test]
fn test_consumed_flag_clears_when_param_destroyed() {
    let broker = Broker::new();
    broker
        .set_preset_value("x", Value::Int(10), Originator::unknown())
        .unwrap();
    {
        let _param = broker.create_param("x", 5i64).build().unwrap();
        assert!(broker.unconsumed_preset_values().is_empty());
    }
    // The preset is claimable again after the consumer is gone.
    let unconsumed = broker.unconsumed_preset_values();
    assert_eq!(unconsumed.len(), 1);
    assert_eq!(unconsumed[0].0, "x");
}

#[test]
fn test_typed_access_through_broker() {
    let broker = Broker::new();
    let _param = broker.create_param("top.rate", 5i64).build().unwrap();

    assert_eq!(broker.get_value::<i64>("top.rate").unwrap(), 5);
    broker
        .set_value("top.rate", 9i64, Originator::new("test"))
        .unwrap();
    assert_eq!(broker.get_value::<i64>("top.rate").unwrap(), 9);

    assert_eq!(
        broker.get_value::<i64>("missing").unwrap_err(),
        CfgError::NotFound("missing".to_string())
    );
    assert!(matches!(
        broker.get_value::<bool>("top.rate").unwrap_err(),
        CfgError::TypeMismatch { .. }
    ));
}

#[test]
fn test_password_lock() {
    let broker = Broker::new();
    let param = broker.create_param("top.rate", 5i64).build().unwrap();
    let key = LockKey::new();

    assert!(param.lock(Some(&key)));
    assert!(param.is_locked());
    assert!(!param.set_value(9), "locked parameter rejects plain writes");
    assert_eq!(param.get_value(), 5);

    let wrong = LockKey::new();
    assert!(!param.unlock(Some(&wrong)));
    assert!(param.is_locked());

    // The matching key may write through the lock.
    assert!(param.set_value_with_key(7, Originator::new("keyed"), &key));
    assert_eq!(param.get_value(), 7);

    assert!(param.unlock(Some(&key)));
    assert!(!param.is_locked());
    assert!(param.set_value(9));
}

#[test]
fn test_identity_lock_pairs_none_with_none() {
    let broker = Broker::new();
    let param = broker.create_param("top.rate", 5i64).build().unwrap();

    assert!(param.lock(None));
    assert!(!param.unlock(Some(&LockKey::new())));
    assert!(param.unlock(None));
    assert!(!param.is_locked());
}

#[test]
fn test_reset_bypasses_lock_and_callbacks() {
    let broker = Broker::new();
    let param = broker.create_param("top.rate", 5i64).build().unwrap();
    param.set_value(9);
    param.on_pre_write(|_| false);
    param.lock(None);

    param.reset();
    // Read without asserting on callbacks; reset itself ran none.
    assert!(param.is_default_value());
}

#[test]
fn test_lifecycle_callbacks_fire_once_in_order() {
    let broker = Broker::new();
    let events = Rc::new(RefCell::new(Vec::new()));

    let log = events.clone();
    broker.on_param_create(move |e: &LifecycleEvent| {
        log.borrow_mut().push(format!("create:{}:{}", e.name, e.originator));
    });
    let log = events.clone();
    broker.on_param_destroy(move |e: &LifecycleEvent| {
        log.borrow_mut().push(format!("destroy:{}", e.name));
    });

    {
        let _param = broker
            .create_param("top.rate", 5i64)
            .with_originator("owner")
            .build()
            .unwrap();
        assert_eq!(*events.borrow(), vec!["create:top.rate:owner".to_string()]);
    }
    assert_eq!(
        *events.borrow(),
        vec![
            "create:top.rate:owner".to_string(),
            "destroy:top.rate".to_string()
        ]
    );
}

#[test]
fn test_unregister_lifecycle_callbacks() {
    let broker = Broker::new();
    let id = broker.on_param_create(|_| {});
    assert!(broker.has_callbacks());
    assert!(broker.unregister_create_callback(id));
    assert!(!broker.unregister_create_callback(id));
    broker.on_param_destroy(|_| {});
    assert!(broker.unregister_all_callbacks());
    assert!(!broker.has_callbacks());
}

#[test]
fn test_params_snapshot_in_name_order() {
    let broker = Broker::new();
    let _b = broker.create_param("b", 1i64).build().unwrap();
    let _a = broker.create_param("a", 2i64).build().unwrap();
    let names: Vec<String> = broker
        .params()
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_default_broker_slot() {
    let broker = Broker::builder().with_name("main").build().unwrap();
    Broker::install_default(&broker);

    let param = Param::builder("top.rate", 5i64).build().unwrap();
    assert!(broker.has_param("top.rate"));
    assert_eq!(param.get_value(), 5);
}

#[test]
fn test_yaml_storage_feeds_presets() {
    let doc = r#"
top:
  producer:
    rate: 10
    burst: 0x1f
  label: steady
"#;
    let storage = YamlStorage::from_str(doc, "").unwrap();
    let broker = Broker::builder().with_storage(storage).build().unwrap();

    let rate = broker.create_param("top.producer.rate", 0i64).build().unwrap();
    let burst = broker.create_param("top.producer.burst", 0i64).build().unwrap();
    let label = broker
        .create_param("top.label", String::new())
        .build()
        .unwrap();

    assert_eq!(rate.get_value(), 10);
    assert_eq!(burst.get_value(), 31);
    assert_eq!(label.get_value(), "steady");
    assert!(broker.unconsumed_preset_values().is_empty());
}

#[test]
fn test_env_storage_feeds_presets() {
    // Tests share the process environment; the prefix keeps this isolated.
    unsafe {
        std::env::set_var("CFGB_IT.top.rate", "12");
    }
    let storage = EnvStorage::new("CFGB_IT");
    let broker = Broker::builder().with_storage(storage).build().unwrap();

    let rate = broker.create_param("top.rate", 0i64).build().unwrap();
    assert_eq!(rate.get_value(), 12);
}

#[test]
fn test_custom_codec_param() {
    use indexmap::IndexMap;

    #[derive(Clone, PartialEq, Debug)]
    struct Endpoint {
        host: String,
        port: i64,
    }

    impl ValueCodec for Endpoint {
        fn pack(&self) -> Value {
            let mut map = IndexMap::new();
            map.insert("host".to_string(), self.host.pack());
            map.insert("port".to_string(), self.port.pack());
            Value::Map(map)
        }

        fn unpack(value: &Value) -> Result<Self> {
            let map = value.as_map().ok_or(CfgError::TypeMismatch {
                expected: ValueKind::Map,
                found: value.kind(),
            })?;
            Ok(Endpoint {
                host: map
                    .get("host")
                    .map(String::unpack)
                    .transpose()?
                    .unwrap_or_default(),
                port: map
                    .get("port")
                    .map(i64::unpack)
                    .transpose()?
                    .unwrap_or_default(),
            })
        }
    }

    let broker = Broker::new();
    let default = Endpoint {
        host: "localhost".into(),
        port: 80,
    };
    let param = broker.create_param("net.endpoint", default).build().unwrap();

    let next = Endpoint {
        host: "example.org".into(),
        port: 443,
    };
    assert!(param.set_value(next.clone()));
    assert_eq!(param.get_value(), next);
    assert_eq!(
        broker.get_value::<Endpoint>("net.endpoint").unwrap(),
        next
    );
}

#[test]
fn test_metadata() {
    let broker = Broker::new();
    let param = broker.create_param("top.rate", 5i64).build().unwrap();
    param.add_metadata("unit", Value::Str("Hz".into()), "measurement unit");

    let meta = param.metadata();
    let map = meta.as_map().unwrap();
    let entry = map.get("unit").unwrap().as_map().unwrap();
    assert_eq!(entry.get("value"), Some(&Value::Str("Hz".into())));
}

#[test]
#[should_panic(expected = "must not be empty")]
fn test_empty_name_panics() {
    let broker = Broker::new();
    let _ = broker.create_param("", 0i64).build();
}
