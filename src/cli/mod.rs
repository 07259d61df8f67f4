//! CLI interface for LoreKeeper.

pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::init::AppContext;
use crate::models::Entity;
use crate::repository::{
    CharacterOptionQuery, CreatureQuery, EquipmentQuery, RepositoryFactory, RuleQuery, SpellQuery,
};
use output::{output_json, output_json_list, print_error, print_header, print_hint, print_table};

/// LoreKeeper - local hybrid search cache for D&D 5e content
#[derive(Parser)]
#[command(name = "lorekeeper", version, about, long_about = None)]
pub struct Cli {
    /// Override data directory (default: ~/.lorekeeper)
    #[arg(long, env = "LOREKEEPER_DATA_PATH", global = true)]
    pub data_path: Option<PathBuf>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which repository domain a `get`/`search` call targets.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum Domain {
    Spell,
    Creature,
    Equipment,
    CharacterOption,
    Rule,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the MCP server (stdio transport)
    Mcp,

    /// Structured lookup of a single entity by slug
    Get {
        /// Repository domain to look in
        domain: Domain,
        /// Entity slug, e.g. "fireball"
        slug: String,
    },

    /// Structured / semantic / hybrid search over a domain
    Search {
        /// Repository domain to search
        domain: Domain,
        /// Free-text query; omit for a pure structured filter
        query: Option<String>,
        /// Maximum results
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Restrict to one or more source documents
        #[arg(long = "document")]
        documents: Vec<String>,

        /// Spell filters
        #[arg(long)]
        level: Option<i64>,
        #[arg(long)]
        school: Option<String>,
        #[arg(long)]
        concentration: Option<bool>,
        #[arg(long)]
        ritual: Option<bool>,
        #[arg(long)]
        class_key: Option<String>,

        /// Creature filters
        #[arg(long)]
        creature_type: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        cr_min: Option<f64>,
        #[arg(long)]
        cr_max: Option<f64>,

        /// Equipment filters
        #[arg(long)]
        item_type: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        rarity: Option<String>,

        /// Character option filters
        #[arg(long)]
        option_type: Option<String>,

        /// Rule filters
        #[arg(long)]
        rule_type: Option<String>,
        #[arg(long)]
        section: Option<String>,
    },

    /// Cache stats: per-collection and total entity counts
    Status,

    /// Import a homebrew catalog file (data-shape-only; not a full 5etools
    /// schema parser) into the cache
    Import {
        /// Path to a JSON file shaped like `{"spell": [...], "monster": [...]}`
        /// or a bare array of entities
        path: PathBuf,
        /// Collection to store entities under (defaults to inferring from the
        /// file's top-level keys)
        #[arg(long)]
        entity_type: Option<String>,
    },
}

fn documents_filter(documents: Vec<String>) -> Option<Vec<String>> {
    if documents.is_empty() {
        None
    } else {
        Some(documents)
    }
}

async fn get_one(
    repositories: &RepositoryFactory,
    domain: Domain,
    slug: &str,
) -> crate::error::Result<Option<Entity>> {
    let entities = match domain {
        Domain::Spell => repositories.spells().get_all().await?,
        Domain::Creature => repositories.creatures().get_all().await?,
        Domain::Equipment => repositories.equipment().get_all().await?,
        Domain::CharacterOption => repositories.character_options().get_all().await?,
        Domain::Rule => repositories.rules().get_all().await?,
    };
    Ok(entities.into_iter().find(|e| e.slug.eq_ignore_ascii_case(slug)))
}

#[allow(clippy::too_many_arguments)]
async fn search(
    repositories: &RepositoryFactory,
    domain: Domain,
    query: Option<String>,
    limit: usize,
    documents: Vec<String>,
    level: Option<i64>,
    school: Option<String>,
    concentration: Option<bool>,
    ritual: Option<bool>,
    class_key: Option<String>,
    creature_type: Option<String>,
    size: Option<String>,
    cr_min: Option<f64>,
    cr_max: Option<f64>,
    item_type: Option<String>,
    category: Option<String>,
    rarity: Option<String>,
    option_type: Option<String>,
    rule_type: Option<String>,
    section: Option<String>,
) -> crate::error::Result<Vec<Entity>> {
    let document = documents_filter(documents);
    match domain {
        Domain::Spell => {
            repositories
                .spells()
                .search(SpellQuery {
                    document,
                    level,
                    school,
                    concentration,
                    ritual,
                    casting_time: None,
                    damage_type: None,
                    name: None,
                    class_key,
                    semantic_query: query,
                    limit,
                })
                .await
        }
        Domain::Creature => {
            repositories
                .creatures()
                .search(CreatureQuery {
                    document,
                    creature_type,
                    size,
                    name: None,
                    cr_min,
                    cr_max,
                    semantic_query: query,
                    limit,
                })
                .await
        }
        Domain::Equipment => {
            repositories
                .equipment()
                .search(EquipmentQuery {
                    item_type,
                    document,
                    category,
                    rarity,
                    damage_type: None,
                    requires_attunement: None,
                    name: None,
                    semantic_query: query,
                    limit,
                })
                .await
        }
        Domain::CharacterOption => {
            repositories
                .character_options()
                .search(CharacterOptionQuery {
                    option_type,
                    document,
                    name: None,
                    semantic_query: query,
                    limit,
                })
                .await
        }
        Domain::Rule => {
            repositories
                .rules()
                .search(RuleQuery {
                    rule_type,
                    document,
                    section,
                    name: None,
                    semantic_query: query,
                    limit,
                })
                .await
        }
    }
}

/// Flatten the upstream v1/v2-style payload shapes a homebrew export might
/// use (`{"spell": [...]}`, `{"results": [...]}`, or a bare array) into a
/// flat list, shaping only — no 5etools schema translation.
fn entities_from_import_file(contents: &str, entity_type: Option<&str>) -> Vec<(String, Entity)> {
    let value: serde_json::Value = match serde_json::from_str(contents) {
        Ok(v) => v,
        Err(e) => {
            print_error(&format!("invalid JSON: {e}"));
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    match value {
        serde_json::Value::Array(items) => {
            let collection = entity_type.unwrap_or("_default").to_string();
            for item in items {
                if let serde_json::Value::Object(obj) = item {
                    out.push((collection.clone(), Entity::from_json(obj)));
                }
            }
        }
        serde_json::Value::Object(top) => {
            for (key, val) in top {
                if let Some(explicit) = entity_type {
                    if key != explicit && key != "results" {
                        continue;
                    }
                }
                if let serde_json::Value::Array(items) = val {
                    let collection = entity_type.map(str::to_string).unwrap_or(key);
                    for item in items {
                        if let serde_json::Value::Object(obj) = item {
                            out.push((collection.clone(), Entity::from_json(obj)));
                        }
                    }
                }
            }
        }
        _ => print_error("expected a JSON array or object at the file's top level"),
    }
    out
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Mcp) {
        let ctx = AppContext::new(cli.data_path).await?;
        return crate::mcp::run_mcp_server(ctx).await;
    }

    let ctx = AppContext::new(cli.data_path).await?;
    let repositories = &ctx.repositories;

    match cli.command {
        Commands::Mcp => unreachable!("handled above"),

        Commands::Get { domain, slug } => match get_one(repositories, domain, &slug).await? {
            Some(entity) => {
                if cli.json {
                    output_json(&entity);
                } else {
                    print_header(&entity.name);
                    for (key, value) in &entity.data {
                        output::print_kv(key, &value.to_string());
                    }
                }
            }
            None => print_error(&format!("no entity found with slug '{slug}'")),
        },

        Commands::Search {
            domain,
            query,
            limit,
            documents,
            level,
            school,
            concentration,
            ritual,
            class_key,
            creature_type,
            size,
            cr_min,
            cr_max,
            item_type,
            category,
            rarity,
            option_type,
            rule_type,
            section,
        } => {
            let entities = search(
                repositories,
                domain,
                query,
                limit,
                documents,
                level,
                school,
                concentration,
                ritual,
                class_key,
                creature_type,
                size,
                cr_min,
                cr_max,
                item_type,
                category,
                rarity,
                option_type,
                rule_type,
                section,
            )
            .await?;

            if cli.json {
                output_json_list(&entities);
            } else if entities.is_empty() {
                print_hint("No results found.");
            } else {
                let rows = entities
                    .iter()
                    .map(|e| {
                        vec![
                            e.slug.clone(),
                            e.name.clone(),
                            e.document.clone(),
                            e.score.map(|s| format!("{s:.3}")).unwrap_or_default(),
                        ]
                    })
                    .collect();
                print_table(&["slug", "name", "document", "score"], rows);
            }
        }

        Commands::Status => {
            let stats = repositories.cache().cache_stats().await?;
            if cli.json {
                output_json(&stats);
            } else {
                print_header("Cache status");
                output::print_kv("db_path", &stats.db_path);
                output::print_kv("total entities", &stats.total.to_string());
                let mut collections: Vec<_> = stats.collections.iter().collect();
                collections.sort_by_key(|(name, _)| name.to_string());
                let rows = collections
                    .into_iter()
                    .map(|(name, count)| vec![name.clone(), count.to_string()])
                    .collect();
                print_table(&["collection", "count"], rows);
            }
        }

        Commands::Import { path, entity_type } => {
            let contents = std::fs::read_to_string(&path)?;
            let entries = entities_from_import_file(&contents, entity_type.as_deref());
            if entries.is_empty() {
                print_error("no importable entities found in file");
                return Ok(());
            }

            let mut by_collection: std::collections::HashMap<String, Vec<Entity>> =
                std::collections::HashMap::new();
            for (collection, entity) in entries {
                by_collection.entry(collection).or_default().push(entity);
            }

            let cache = repositories.cache();
            let mut total = 0usize;
            for (collection, entities) in by_collection {
                let count = entities.len();
                match cache.store_entities(&collection, entities).await {
                    Ok(stored) => {
                        total += stored;
                        output::print_success(&format!(
                            "imported {stored}/{count} entities into '{collection}'"
                        ));
                    }
                    Err(e) => print_error(&format!("failed to import into '{collection}': {e}")),
                }
            }
            output::print_success(&format!("imported {total} entities total"));
        }
    }

    Ok(())
}
