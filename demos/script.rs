use mysql_commando::{Config, DriverOptions, MysqlCommando};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: script <config.json> <script.sql>"))?;
    let script_path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: script <config.json> <script.sql>"))?;

    let db = MysqlCommando::new(Config::from_json_file(config_path)?).with_options(DriverOptions {
        timeout_ms: Some(30_000),
        ..DriverOptions::default()
    });

    let result = db.run_script(&script_path).await?;
    println!("{}", result.columns().join("\t"));
    for record in result {
        let values: Vec<String> = record.iter().map(|(_, value)| format!("{value:?}")).collect();
        println!("{}", values.join("\t"));
    }

    Ok(())
}
