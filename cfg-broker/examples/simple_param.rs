//! Minimal usage: one broker, a couple of parameters, a preset override.

use cfg_broker::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let broker = Broker::builder().with_name("demo").build()?;
    Broker::install_default(&broker);

    // Deployment configuration arrives before the components exist.
    broker.set_preset_value("producer.rate", Value::Int(10), "cmdline".into())?;

    let rate = broker
        .create_param("producer.rate", 1i64)
        .with_description("packets produced per cycle")
        .build()?;
    let label = Param::builder("producer.label", String::from("default"))
        .with_description("display label")
        .build()?;

    println!("{} = {} (origin: {})", rate.name(), rate.get_value(), rate.value_origin());
    println!("{} = {}", label.name(), label.get_value());

    rate.set_value_by(25, Originator::new("runtime"));
    println!("{} = {} (origin: {})", rate.name(), rate.get_value(), rate.value_origin());

    Ok(())
}
