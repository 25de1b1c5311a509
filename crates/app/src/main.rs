use anyhow::Context;

use dispatchdesk_app::{DeskConfig, FulfillmentDesk, demo};
use dispatchdesk_parties::FieldRepRoster;

fn main() -> anyhow::Result<()> {
    let config = DeskConfig::load().context("failed to load configuration")?;
    dispatchdesk_observability::init(&config.log);

    let desk = if config.seed_demo_data {
        demo::seeded_desk(&config.currency).context("failed to seed demo data")?
    } else {
        tracing::warn!("demo data disabled; starting with an empty desk");
        FulfillmentDesk::new(FieldRepRoster::new()).with_currency(&config.currency)
    };

    let dashboard = desk.dashboard()?;
    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}
