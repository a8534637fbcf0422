//! Knowledge graph access.
//!
//! [`KnowledgeGraph`] is what the graph builder consumes. [`WikidataClient`]
//! answers it with SPARQL queries against the Wikidata query service.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::FlowlabelError;

pub const DEFAULT_SPARQL_ENDPOINT: &str = "https://query.wikidata.org/bigdata/namespace/wdq/sparql";

const USER_AGENT: &str = concat!("flowlabel/", env!("CARGO_PKG_VERSION"));
const SPARQL_JSON: &str = "application/sparql-results+json";

/// Properties whose values are Wikimedia bookkeeping rather than content.
const EXCLUDED_PROPERTIES: &[&str] = &[
    "P1424", // topic's main template
    "P1482", // Stack Exchange tag
    "P1855", // Wikidata property example
    "P5008", // on focus list of Wikimedia project
    "P6104", // maintained by WikiProject
    "P1963", // properties for this type
    "P2559", // Wikidata usage instructions
    "P373",  // Commons category
    "P1472", // Commons Creator page
    "P1612", // Commons Institution page
    "P3722", // Commons maps category
    "P910",  // topic's main category
    "P301",  // category's main topic
    "P5125", // Wikimedia outline
];

/// Wikimedia meta classes whose instances have no useful descendants.
const EXCLUDED_CLASSES: &[&str] = &[
    "Q4167836",  // Wikimedia category
    "Q26884324", // Wikimedia set category
    "Q4167410",  // Wikimedia disambiguation page
];

/// One outgoing statement of an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descendant {
    /// Entity code of the value; empty when the value is a literal.
    pub qid: String,
    /// Display value: the value's label, or the literal itself.
    pub value: String,
    /// Label of the statement's property.
    pub property: String,
}

/// Entity lookups used to grow a graph.
pub trait KnowledgeGraph {
    /// English label of an entity code.
    fn label(&self, code: &str) -> Result<Option<String>, FlowlabelError>;

    /// Entity code of an English label.
    fn entity_code(&self, label: &str) -> Result<Option<String>, FlowlabelError>;

    /// Direct descendants of an entity.
    fn children(&self, code: &str) -> Result<Vec<Descendant>, FlowlabelError>;

    /// Whether `url` serves an image.
    fn is_image_url(&self, _url: &str) -> bool {
        false
    }
}

/// An entity with both its code and label known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEntity {
    pub code: String,
    pub label: String,
}

/// Resolves user input that may be either an entity code (`Q42`) or a label.
pub fn resolve_entity<K>(knowledge: &K, input: &str) -> Result<ResolvedEntity, FlowlabelError>
where
    K: KnowledgeGraph + ?Sized,
{
    let input = input.trim();
    let incomplete = |message: &str| FlowlabelError::IncompleteQueryResult {
        entity: input.to_string(),
        message: message.to_string(),
    };

    if is_entity_code(input) {
        let label = knowledge
            .label(input)?
            .ok_or_else(|| incomplete("entity code has no English label"))?;
        return Ok(ResolvedEntity {
            code: input.to_string(),
            label,
        });
    }

    let code = knowledge
        .entity_code(input)?
        .ok_or_else(|| incomplete("no entity carries this English label"))?;
    Ok(ResolvedEntity {
        code,
        label: input.to_string(),
    })
}

/// `Q` followed by one or more digits.
pub fn is_entity_code(raw: &str) -> bool {
    raw.strip_prefix('Q')
        .map(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// SPARQL client for the Wikidata query service.
#[derive(Clone, Debug)]
pub struct WikidataClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl WikidataClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            endpoint: endpoint.into(),
            agent: config.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Entity codes of `limit` humans starting at `offset`.
    pub fn humans(&self, limit: usize, offset: usize) -> Result<Vec<String>, FlowlabelError> {
        let query = format!(
            "SELECT ?entity WHERE {{ ?entity wdt:P31 wd:Q5 . }} LIMIT {limit} OFFSET {offset}"
        );
        let result = self.query(&query)?;
        Ok(bindings(&result)
            .iter()
            .filter_map(|binding| binding_value(binding, "entity"))
            .filter_map(|uri| uri.rsplit('/').next().map(ToOwned::to_owned))
            .filter(|code| is_entity_code(code))
            .collect())
    }

    fn query(&self, sparql: &str) -> Result<Value, FlowlabelError> {
        let mut url = url::Url::parse(&self.endpoint).map_err(|source| {
            FlowlabelError::KnowledgeQuery {
                message: format!("invalid endpoint '{}': {source}", self.endpoint),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("query", sparql)
            .append_pair("format", "json");

        debug!(endpoint = %self.endpoint, "running SPARQL query");
        let mut response = self
            .agent
            .get(url.as_str())
            .header("Accept", SPARQL_JSON)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|source| FlowlabelError::KnowledgeQuery {
                message: source.to_string(),
            })?;
        response
            .body_mut()
            .read_json::<Value>()
            .map_err(|source| FlowlabelError::KnowledgeQuery {
                message: format!("invalid SPARQL JSON: {source}"),
            })
    }
}

impl KnowledgeGraph for WikidataClient {
    fn label(&self, code: &str) -> Result<Option<String>, FlowlabelError> {
        let query = format!(
            "PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
             PREFIX wd: <http://www.wikidata.org/entity/>\n\
             SELECT * WHERE {{\n  wd:{code} rdfs:label ?label .\n  \
             FILTER (langMatches(lang(?label), \"EN\"))\n}}\nLIMIT 1"
        );
        let result = self.query(&query)?;
        Ok(bindings(&result)
            .first()
            .and_then(|binding| binding_value(binding, "label"))
            .map(ToOwned::to_owned))
    }

    fn entity_code(&self, label: &str) -> Result<Option<String>, FlowlabelError> {
        let query = format!(
            "PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
             PREFIX wd: <http://www.wikidata.org/entity/>\n\
             SELECT ?qid WHERE {{\n  ?wd rdfs:label \"{}\"@en .\n  \
             BIND(STRAFTER(STR(?wd), STR(wd:)) AS ?qid) .\n}}\nLIMIT 1",
            sparql_escape(label)
        );
        let result = self.query(&query)?;
        Ok(bindings(&result)
            .first()
            .and_then(|binding| binding_value(binding, "qid"))
            .filter(|qid| !qid.is_empty())
            .map(ToOwned::to_owned))
    }

    fn children(&self, code: &str) -> Result<Vec<Descendant>, FlowlabelError> {
        let result = self.query(&descendants_query(code))?;
        Ok(bindings(&result)
            .iter()
            .filter_map(|binding| {
                Some(Descendant {
                    qid: binding_value(binding, "qid").unwrap_or_default().to_string(),
                    value: binding_value(binding, "valueLabel")?.to_string(),
                    property: binding_value(binding, "propLabel")?.to_string(),
                })
            })
            .collect())
    }

    fn is_image_url(&self, url: &str) -> bool {
        let response = self.agent.get(url).header("User-Agent", USER_AGENT).call();
        match response {
            Ok(response) => response
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok())
                .map(|content_type| content_type.starts_with("image/"))
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

fn descendants_query(code: &str) -> String {
    let mut query = format!(
        "SELECT ?qid ?valueLabel ?propLabel WHERE {{\n  VALUES ?item {{ wd:{code} }}\n  ?item ?a ?value .\n"
    );
    for class in EXCLUDED_CLASSES {
        query.push_str(&format!("  MINUS {{ ?item wdt:P31 wd:{class} }}\n"));
    }
    query.push_str("  BIND(STRAFTER(STR(?value), STR(wd:)) AS ?qid) .\n");
    query.push_str("  ?prop wikibase:directClaim ?a .\n");
    query.push_str("  MINUS { ?prop wikibase:propertyType wikibase:ExternalId . }\n");
    for property in EXCLUDED_PROPERTIES {
        query.push_str(&format!("  FILTER (?prop != wd:{property})\n"));
    }
    query.push_str("  SERVICE wikibase:label { bd:serviceParam wikibase:language \"en\". }\n}");
    query
}

fn bindings(result: &Value) -> &[Value] {
    result
        .get("results")
        .and_then(|results| results.get("bindings"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn binding_value<'a>(binding: &'a Value, var: &str) -> Option<&'a str> {
    binding
        .get(var)
        .and_then(|cell| cell.get("value"))
        .and_then(Value::as_str)
}

fn sparql_escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
