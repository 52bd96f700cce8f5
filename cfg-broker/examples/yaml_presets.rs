//! Feeding presets from a YAML document and auditing leftovers.

use cfg_broker::prelude::*;

const CONFIG: &str = r#"
producer:
  rate: 10
  burst: 0x20
  label: steady
consumer:
  timeout: 2.5
debug:
  trace: true
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let storage = YamlStorage::from_str(CONFIG, "")?;
    let broker = Broker::builder()
        .with_name("yaml-demo")
        .with_storage(storage)
        .build()?;

    let rate = broker.create_param("producer.rate", 1i64).build()?;
    let burst = broker.create_param("producer.burst", 0i64).build()?;
    let label = broker
        .create_param("producer.label", String::new())
        .build()?;
    let timeout = broker.create_param("consumer.timeout", 1.0f64).build()?;

    println!("rate    = {}", rate.get_value());
    println!("burst   = {}", burst.get_value());
    println!("label   = {}", label.get_value());
    println!("timeout = {}", timeout.get_value());

    // Anything under debug.* is tooling configuration, not a parameter.
    broker.ignore_unconsumed_presets(|name, _| name.starts_with("debug."));
    for (name, value) in broker.unconsumed_preset_values() {
        println!("unused preset: {} = {}", name, value.to_json());
    }

    Ok(())
}
