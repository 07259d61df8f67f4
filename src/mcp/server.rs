use rmcp::{
    handler::server::tool::ToolRouter,
    handler::server::wrapper::{Json, Parameters},
    model::*,
    tool, tool_handler, tool_router, ServerHandler,
};

use crate::mcp::error::ToolError;
use crate::mcp::types::{
    clamp_limit, CacheStatusResponse, CharacterOptionSearchInput, CreatureSearchInput,
    DocumentListResponse, DocumentMetadataInput, DocumentMetadataResponse, EntityListResponse,
    EquipmentSearchInput, LookupInput, RuleSearchInput, SpellSearchInput,
};
use crate::models::Entity;
use crate::repository::{
    CharacterOptionQuery, CreatureQuery, EquipmentQuery, RepositoryFactory, RuleQuery, SpellQuery,
};

/// MCP server exposing LoreKeeper's repositories as a thin tool surface: no
/// business logic beyond parameter validation and dictionary shaping, all of
/// it delegated to the repository layer.
#[derive(Clone)]
pub struct LoreKeeperServer {
    repositories: RepositoryFactory,
    tool_router: ToolRouter<Self>,
}

fn find_by_slug(entities: Vec<Entity>, slug: &str) -> Option<Entity> {
    entities
        .into_iter()
        .find(|e| e.slug.eq_ignore_ascii_case(slug))
}

#[tool_router]
impl LoreKeeperServer {
    pub fn new(repositories: RepositoryFactory) -> Self {
        Self {
            repositories,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Look up one spell by slug, e.g. \"fireball\". Returns the full cached record."
    )]
    pub async fn lookup_spell(
        &self,
        request: Parameters<LookupInput>,
    ) -> Result<Json<EntityListResponse>, ToolError> {
        let Parameters(input) = request;
        let entities = self.repositories.spells().get_all().await?;
        let found = find_by_slug(entities, &input.slug).into_iter().collect();
        Ok(Json(EntityListResponse::from(found)))
    }

    #[tool(
        description = "Search spells by level, school, concentration, ritual, class, and/or free-text meaning. Omit `query` for a pure structured filter."
    )]
    pub async fn search_spells(
        &self,
        request: Parameters<SpellSearchInput>,
    ) -> Result<Json<EntityListResponse>, ToolError> {
        let Parameters(input) = request;
        let query = SpellQuery {
            document: input.document,
            level: input.level,
            school: input.school,
            concentration: input.concentration,
            ritual: input.ritual,
            casting_time: None,
            damage_type: None,
            name: None,
            class_key: input.class_key,
            semantic_query: input.query,
            limit: clamp_limit(input.limit),
        };
        let entities = self.repositories.spells().search(query).await?;
        Ok(Json(EntityListResponse::from(entities)))
    }

    #[tool(
        description = "Look up one creature (monster/NPC statblock) by slug, e.g. \"adult-red-dragon\"."
    )]
    pub async fn lookup_creature(
        &self,
        request: Parameters<LookupInput>,
    ) -> Result<Json<EntityListResponse>, ToolError> {
        let Parameters(input) = request;
        let entities = self.repositories.creatures().get_all().await?;
        let found = find_by_slug(entities, &input.slug).into_iter().collect();
        Ok(Json(EntityListResponse::from(found)))
    }

    #[tool(
        description = "Search creatures by type, size, challenge rating range (cr_min/cr_max), and/or free-text meaning."
    )]
    pub async fn search_creatures(
        &self,
        request: Parameters<CreatureSearchInput>,
    ) -> Result<Json<EntityListResponse>, ToolError> {
        let Parameters(input) = request;
        let query = CreatureQuery {
            document: input.document,
            creature_type: input.creature_type,
            size: input.size,
            name: None,
            cr_min: input.cr_min,
            cr_max: input.cr_max,
            semantic_query: input.query,
            limit: clamp_limit(input.limit),
        };
        let entities = self.repositories.creatures().search(query).await?;
        Ok(Json(EntityListResponse::from(entities)))
    }

    #[tool(
        description = "Look up one piece of equipment (weapon, armor, or magic item) by slug."
    )]
    pub async fn lookup_equipment(
        &self,
        request: Parameters<LookupInput>,
    ) -> Result<Json<EntityListResponse>, ToolError> {
        let Parameters(input) = request;
        let entities = self.repositories.equipment().get_all().await?;
        let found = find_by_slug(entities, &input.slug).into_iter().collect();
        Ok(Json(EntityListResponse::from(found)))
    }

    #[tool(
        description = "Search equipment. `item_type` selects \"weapon\", \"armor\", \"magicitem\", or \"all\" (default); combine with free-text meaning."
    )]
    pub async fn search_equipment(
        &self,
        request: Parameters<EquipmentSearchInput>,
    ) -> Result<Json<EntityListResponse>, ToolError> {
        let Parameters(input) = request;
        let query = EquipmentQuery {
            item_type: input.item_type,
            document: input.document,
            category: input.category,
            rarity: input.rarity,
            damage_type: None,
            requires_attunement: None,
            name: None,
            semantic_query: input.query,
            limit: clamp_limit(input.limit),
        };
        let entities = self.repositories.equipment().search(query).await?;
        Ok(Json(EntityListResponse::from(entities)))
    }

    #[tool(
        description = "Look up one character option (class, race, background, feat, or condition) by slug."
    )]
    pub async fn lookup_character_option(
        &self,
        request: Parameters<LookupInput>,
    ) -> Result<Json<EntityListResponse>, ToolError> {
        let Parameters(input) = request;
        let entities = self.repositories.character_options().get_all().await?;
        let found = find_by_slug(entities, &input.slug).into_iter().collect();
        Ok(Json(EntityListResponse::from(found)))
    }

    #[tool(
        description = "Search character options. `option_type` selects \"class\", \"race\", \"background\", \"feat\", \"condition\", or \"all\" (default); combine with free-text meaning."
    )]
    pub async fn search_character_options(
        &self,
        request: Parameters<CharacterOptionSearchInput>,
    ) -> Result<Json<EntityListResponse>, ToolError> {
        let Parameters(input) = request;
        let query = CharacterOptionQuery {
            option_type: input.option_type,
            document: input.document,
            name: None,
            semantic_query: input.query,
            limit: clamp_limit(input.limit),
        };
        let entities = self
            .repositories
            .character_options()
            .search(query)
            .await?;
        Ok(Json(EntityListResponse::from(entities)))
    }

    #[tool(
        description = "Look up one rule/reference entry (rule, condition, damage type, skill, etc.) by slug."
    )]
    pub async fn lookup_rule(
        &self,
        request: Parameters<LookupInput>,
    ) -> Result<Json<EntityListResponse>, ToolError> {
        let Parameters(input) = request;
        let entities = self.repositories.rules().get_all().await?;
        let found = find_by_slug(entities, &input.slug).into_iter().collect();
        Ok(Json(EntityListResponse::from(found)))
    }

    #[tool(
        description = "Search rules and reference entries. `rule_type` selects one collection (e.g. \"rules\", \"skills\", \"alignments\") or fans out across all when omitted. `section` further filters within \"rules\"."
    )]
    pub async fn search_rules(
        &self,
        request: Parameters<RuleSearchInput>,
    ) -> Result<Json<EntityListResponse>, ToolError> {
        let Parameters(input) = request;
        let query = RuleQuery {
            rule_type: input.rule_type,
            document: input.document,
            section: input.section,
            name: None,
            semantic_query: input.query,
            limit: clamp_limit(input.limit),
        };
        let entities = self.repositories.rules().search(query).await?;
        Ok(Json(EntityListResponse::from(entities)))
    }

    #[tool(description = "List every source document (book/SRD) currently represented in the cache.")]
    pub async fn list_documents(&self) -> Result<Json<DocumentListResponse>, ToolError> {
        let documents = self.repositories.cache().available_documents().await?;
        Ok(Json(DocumentListResponse { documents }))
    }

    #[tool(
        description = "Per-collection entity counts restricted to a single source document."
    )]
    pub async fn document_metadata(
        &self,
        request: Parameters<DocumentMetadataInput>,
    ) -> Result<Json<DocumentMetadataResponse>, ToolError> {
        let Parameters(input) = request;
        let counts = self
            .repositories
            .cache()
            .document_metadata(&input.document)
            .await?;
        Ok(Json(DocumentMetadataResponse {
            document: input.document,
            counts,
        }))
    }

    #[tool(description = "Aggregate cache stats: per-collection and total entity counts, plus the on-disk store path.")]
    pub async fn cache_status(&self) -> Result<Json<CacheStatusResponse>, ToolError> {
        let stats = self.repositories.cache().cache_stats().await?;
        Ok(Json(CacheStatusResponse {
            collections: stats.collections,
            total: stats.total,
            db_path: stats.db_path,
        }))
    }
}

#[tool_handler]
impl ServerHandler for LoreKeeperServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "lorekeeper".to_string(),
                title: Some("LoreKeeper D&D 5e Catalog Cache".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "# LoreKeeper\n\n\
                 Local hybrid search over a cached D&D 5e catalog (spells, creatures, \
                 equipment, character options, rules).\n\n\
                 ## Tools\n\
                 - lookup_spell / lookup_creature / lookup_equipment / \
                 lookup_character_option / lookup_rule — fetch one entity by slug\n\
                 - search_spells / search_creatures / search_equipment / \
                 search_character_options / search_rules — structured filters plus an \
                 optional free-text `query` for semantic ranking\n\
                 - list_documents — which source books are cached\n\
                 - document_metadata — entity counts for one source document\n\
                 - cache_status — aggregate cache stats\n\n\
                 A `query` that doesn't semantically rank (structured-only cache backend) \
                 falls back to a name match automatically."
                    .to_string(),
            ),
        }
    }
}

/// Run the MCP server on stdio transport.
pub async fn run_mcp_server(ctx: crate::init::AppContext) -> anyhow::Result<()> {
    use rmcp::ServiceExt;

    let server = LoreKeeperServer::new(ctx.repositories);
    tracing::info!("Starting LoreKeeper MCP server v{}", env!("CARGO_PKG_VERSION"));

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = server.serve(transport).await?;
    tracing::info!("MCP server listening on stdio");

    service.waiting().await?;
    tracing::info!("MCP server shutting down");
    Ok(())
}
