use mysql_commando::{MysqlCommando, Params, Value};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = MysqlCommando::from_env()?;

    db.run_query(
        "CREATE TABLE IF NOT EXISTS users (id INTEGER AUTO_INCREMENT PRIMARY KEY, name TEXT NOT NULL)",
        (),
    )
    .await?;

    let id = db
        .last_insert_id("INSERT INTO users (name) VALUES (%s)", [Value::text("Kit")])
        .await?;
    println!("inserted user {id}");

    let result = db
        .run_query(
            "SELECT id, name FROM users WHERE name = %(name)s",
            Params::named([("name", Value::text("Kit"))]),
        )
        .await?;

    for record in &result {
        println!("{record:?}");
    }

    Ok(())
}
