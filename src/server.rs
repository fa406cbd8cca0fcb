//! MCP server exposing a loaded documentation index.

use crate::search::{QueryOptions, SearchIndex};
use crate::tools::info::handle_index_info;
use crate::tools::lookup::{LookupObjectRequest, handle_lookup_object};
use crate::tools::search::{SearchRequest, handle_search};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::path::PathBuf;
use std::sync::Arc;

/// MCP server answering queries against one frozen index.
///
/// The index is immutable once loaded, so concurrent tool calls share it without locking.
#[derive(Clone)]
pub struct DocIndexServer {
    index: Arc<SearchIndex>,
    /// File the index was loaded from, shown by `index_info`
    source: Option<PathBuf>,
    options: QueryOptions,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for DocIndexServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocIndexServer")
            .field("documents", &self.index.document_count())
            .field("source", &self.source)
            .field("options", &self.options)
            .finish()
    }
}

#[tool_router]
impl DocIndexServer {
    pub fn new(index: Arc<SearchIndex>, options: QueryOptions) -> Self {
        Self {
            index,
            source: None,
            options,
            tool_router: Self::tool_router(),
        }
    }

    /// Records the file the index was loaded from.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[tool(
        description = "Search the documentation pages. Pages defining an object whose qualified name equals or ends with the query are listed first, then pages ranked by how many query words they contain and how often.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.index, &self.options, request)
    }

    #[tool(
        description = "Look up documented objects (modules, classes, methods, attributes, functions) by bare or qualified name and report the page that defines each one.",
        input_schema = inline_schema_for_type::<LookupObjectRequest>()
    )]
    async fn lookup_object(
        &self,
        Parameters(request): Parameters<LookupObjectRequest>,
    ) -> std::result::Result<String, String> {
        handle_lookup_object(&self.index, self.options.default_limit, request)
    }

    #[tool(description = "Summarize the loaded index: document, object, and term counts and tokenizer settings.")]
    async fn index_info(&self) -> std::result::Result<String, String> {
        handle_index_info(&self.index, self.source.as_deref())
    }
}

#[tool_handler]
impl ServerHandler for DocIndexServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "docindex: full-text search over a documentation site's pages. \
                 Use search for words or qualified names, lookup_object to find where a \
                 class or function is documented, and index_info to see what is loaded.",
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this function sets `inline_subschemas = true`
/// so the object kind enum is listed inline instead of behind a `$ref`.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}
