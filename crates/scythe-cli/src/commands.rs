//! Subcommand implementations.

use std::path::Path;

use scythe_core::{
    CatalogStore, DeletionPlan, PlanConfig, RelationshipGraph, Row, SchemaCatalog, SledStore,
    StoreConfig, Value,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Parse a schema catalog from JSON and persist it as the next version.
pub fn apply(db: &Path, schema: &Path) -> CliResult {
    let json = std::fs::read_to_string(schema)?;
    let catalog: SchemaCatalog = serde_json::from_str(&json)?;

    let store = SledStore::open(StoreConfig::new(db))?;
    let catalogs = CatalogStore::open(store.db())?;
    let version = catalogs.apply(catalog)?;
    catalogs.flush()?;

    println!("Applied schema version {}", version);
    Ok(())
}

/// Load rows from a JSON document of the form `{"table": [{...}, ...]}`.
pub fn load(db: &Path, data: &Path) -> CliResult {
    let json = std::fs::read_to_string(data)?;
    let tables: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&json)?;

    let store = SledStore::open(StoreConfig::new(db))?;
    let catalogs = CatalogStore::open(store.db())?;
    let catalog = current_catalog(&catalogs)?;

    let mut total = 0u64;
    for (table, rows) in &tables {
        let entity = catalog
            .entity_by_table(table)
            .ok_or_else(|| format!("no entity backed by table `{}`", table))?;
        let rows = rows
            .as_array()
            .ok_or_else(|| format!("table `{}` must hold an array of rows", table))?;
        for row_json in rows {
            let object = row_json
                .as_object()
                .ok_or_else(|| format!("rows of `{}` must be objects", table))?;
            let mut row = Row::new();
            for (column, value) in object {
                row = row.with(column.as_str(), Value::from_json(value)?);
            }
            let key = row
                .get(&entity.primary_key)
                .ok_or_else(|| {
                    format!(
                        "row in `{}` is missing primary key `{}`",
                        table, entity.primary_key
                    )
                })?
                .clone();
            store.insert(table, &key, &row)?;
            total += 1;
        }
    }
    store.flush()?;

    println!("Loaded {} rows across {} tables", total, tables.len());
    Ok(())
}

/// Print the resolved relationship set of one entity.
pub fn graph(db: &Path, entity: &str) -> CliResult {
    let store = SledStore::open(StoreConfig::new(db))?;
    let catalogs = CatalogStore::open(store.db())?;
    let graph = RelationshipGraph::new(current_catalog(&catalogs)?);

    let rels = graph.relationships(entity)?;
    if rels.is_empty() {
        println!("{}: no relationships", entity);
        return Ok(());
    }
    for rel in rels.iter() {
        println!(
            "{:<24} {:<10} -> {} ({}.{})",
            rel.name, rel.kind, rel.target, rel.target_table, rel.foreign_key
        );
    }
    Ok(())
}

/// Build a deletion plan from JSON and run it against the given ids.
pub fn run_plan(db: &Path, plan_path: &Path, entity: &str, ids: &[String]) -> CliResult {
    let json = std::fs::read_to_string(plan_path)?;
    let node = PlanConfig::from_json(&json)?.into_plan()?;

    let store = SledStore::open(StoreConfig::new(db))?;
    let catalogs = CatalogStore::open(store.db())?;
    let graph = RelationshipGraph::new(current_catalog(&catalogs)?);

    let plan = DeletionPlan::build(&graph, entity, &node)?;
    let targets: Vec<Value> = ids.iter().map(|raw| parse_id(raw)).collect();
    plan.execute(&store, &targets)?;
    store.flush()?;

    println!(
        "Cascade finished for {} target(s) in {}",
        targets.len(),
        plan.root().scope().table
    );
    Ok(())
}

fn current_catalog(
    catalogs: &CatalogStore,
) -> Result<std::sync::Arc<SchemaCatalog>, Box<dyn std::error::Error>> {
    catalogs
        .current()
        .ok_or_else(|| "no schema applied; run `scythe apply` first".into())
}

/// Ids on the command line are integers when they parse as such, strings
/// otherwise.
fn parse_id(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(n) => Value::Int64(n),
        Err(_) => Value::String(raw.to_string()),
    }
}
