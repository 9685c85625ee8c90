//! Built-in tool catalog
//!
//! JSON-schema descriptions of the tool modules callers commonly offer to
//! models: time and date, Brave web search, BBC news and Wikipedia. Only the
//! schemas live here; executing the tools is up to the caller.

use serde_json::{json, Map, Value};

use crate::error::RouterError;
use crate::schemas::tool::{ToolDefinition, ToolSet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    Int(i64),
    Str(&'static str),
}

impl From<ParamDefault> for Value {
    fn from(default: ParamDefault) -> Self {
        match default {
            ParamDefault::Int(i) => Value::from(i),
            ParamDefault::Str(s) => Value::from(s),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    /// JSON-schema type name
    pub kind: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<ParamDefault>,
    /// Element type for `array` parameters
    pub items: Option<&'static str>,
}

impl ParamSpec {
    const fn new(name: &'static str, kind: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            default: None,
            items: None,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn default_value(mut self, default: ParamDefault) -> Self {
        self.default = Some(default);
        self
    }

    const fn items(mut self, items: &'static str) -> Self {
        self.items = Some(items);
        self
    }

    fn schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".to_string(), Value::from(self.kind));
        property.insert("description".to_string(), Value::from(self.description));
        if let Some(default) = self.default {
            property.insert("default".to_string(), default.into());
        }
        if let Some(items) = self.items {
            property.insert("items".to_string(), json!({ "type": items }));
        }
        Value::Object(property)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl FunctionSpec {
    /// Parameters schema with per-parameter `required` flags collected into
    /// the object's `required` list.
    pub fn definition(&self) -> ToolDefinition {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        ToolDefinition::new(
            self.name,
            self.description,
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ToolModule {
    pub id: &'static str,
    pub description: &'static str,
    pub functions: &'static [FunctionSpec],
}

// ============================================================================
// Catalog
// ============================================================================

pub const TOOL_MODULES: &[ToolModule] = &[
    ToolModule {
        id: "time_and_date",
        description: "Current time and date lookups",
        functions: &[
            FunctionSpec {
                name: "get_current_time",
                description: "Get the current time, optionally in a specific timezone",
                params: &[ParamSpec::new(
                    "timezone",
                    "string",
                    "IANA timezone name such as 'Europe/London'; defaults to UTC",
                )],
            },
            FunctionSpec {
                name: "get_current_date",
                description: "Get the current date",
                params: &[ParamSpec::new("format", "string", "strftime-style date format")
                    .default_value(ParamDefault::Str("%Y-%m-%d"))],
            },
        ],
    },
    ToolModule {
        id: "web_search_brave",
        description: "Web search through the Brave Search API",
        functions: &[FunctionSpec {
            name: "search_web",
            description: "Search the web and return the top results",
            params: &[
                ParamSpec::new("query", "string", "Search query").required(),
                ParamSpec::new("count", "integer", "Number of results to return")
                    .default_value(ParamDefault::Int(5)),
            ],
        }],
    },
    ToolModule {
        id: "bbc_rss",
        description: "BBC News RSS feeds",
        functions: &[
            FunctionSpec {
                name: "get_bbc_latest_news",
                description: "Get the latest BBC News headlines",
                params: &[],
            },
            FunctionSpec {
                name: "get_bbc_news_summary",
                description: "Summarize BBC News articles for a category",
                params: &[
                    ParamSpec::new(
                        "category",
                        "string",
                        "News category such as 'world', 'business' or 'technology'",
                    )
                    .default_value(ParamDefault::Str("top_stories")),
                    ParamSpec::new("max_articles", "integer", "Maximum number of articles")
                        .default_value(ParamDefault::Int(10)),
                ],
            },
            FunctionSpec {
                name: "get_bbc_public_figures",
                description: "List public figures mentioned in current BBC News stories",
                params: &[],
            },
            FunctionSpec {
                name: "get_bbc_rss_feed",
                description: "Fetch and parse a BBC RSS feed",
                params: &[ParamSpec::new("feed_url", "string", "RSS feed URL")
                    .default_value(ParamDefault::Str("https://feeds.bbci.co.uk/news/rss.xml"))],
            },
        ],
    },
    ToolModule {
        id: "wikipedia_api",
        description: "Wikipedia search and page lookups",
        functions: &[
            FunctionSpec {
                name: "search_wikipedia",
                description: "Search Wikipedia for articles matching a query",
                params: &[
                    ParamSpec::new("query", "string", "Search query").required(),
                    ParamSpec::new("limit", "integer", "Maximum number of results")
                        .default_value(ParamDefault::Int(10)),
                ],
            },
            FunctionSpec {
                name: "get_wikipedia_page",
                description: "Get the summary and content of a Wikipedia page",
                params: &[ParamSpec::new("title", "string", "Page title").required()],
            },
            FunctionSpec {
                name: "find_person_wikipedia_page",
                description: "Find the Wikipedia page for a person",
                params: &[ParamSpec::new("person_name", "string", "Full name of the person").required()],
            },
            FunctionSpec {
                name: "get_multiple_people_wikipedia_pages",
                description: "Find Wikipedia pages for several people at once",
                params: &[ParamSpec::new("person_names", "array", "Names of the people")
                    .items("string")
                    .required()],
            },
        ],
    },
];

/// Look up a single function's schema.
pub fn schema(function: &str) -> Option<ToolDefinition> {
    functions().find(|f| f.name == function).map(|f| f.definition())
}

/// Every catalog function as one tool set.
pub fn all() -> Result<ToolSet, RouterError> {
    ToolSet::new(functions().map(|f| f.definition()).collect())
}

/// Tool set for a list of module ids or function names, in the given order.
pub fn select(names: &[impl AsRef<str>]) -> Result<ToolSet, RouterError> {
    let mut definitions = Vec::new();
    for name in names {
        let name = name.as_ref();
        if let Some(module) = TOOL_MODULES.iter().find(|m| m.id == name) {
            definitions.extend(module.functions.iter().map(FunctionSpec::definition));
        } else if let Some(definition) = schema(name) {
            definitions.push(definition);
        } else {
            return Err(RouterError::InvalidRequest(format!("unknown tool '{}'", name)));
        }
    }
    ToolSet::new(definitions)
}

fn functions() -> impl Iterator<Item = &'static FunctionSpec> {
    TOOL_MODULES.iter().flat_map(|m| m.functions.iter())
}
