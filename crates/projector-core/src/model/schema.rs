//! Model description and the edge table built from it

use crate::errors::{ProjectionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Whether an edge leads to one related row or many
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Singular,
    Collection,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Singular => "singular",
            Cardinality::Collection => "collection",
        }
    }
}

/// How the rows on both ends of an edge are matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Join {
    /// Column on the owning row holding the target's primary key
    Local { column: String },
    /// Column on the target row holding the owner's primary key
    Remote { column: String },
    /// Association table holding both primary keys
    Through {
        table: String,
        local: String,
        remote: String,
    },
}

/// A named, directed relationship from one class to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub field: String,
    pub target: String,
    pub cardinality: Cardinality,
    pub join: Join,
}

/// One entity class and its outgoing edges, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityClass {
    pub name: String,
    pub table: String,
    pub primary_key: String,
    pub edges: Vec<Edge>,
}

// ---------------------------------------------------------------------------
// Description (on-disk YAML shape)
// ---------------------------------------------------------------------------

/// Top-level model description file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescription {
    pub classes: BTreeMap<String, ClassDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDescription {
    /// Table name; defaults to the class name
    #[serde(default)]
    pub table: Option<String>,

    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    #[serde(default)]
    pub relationships: Vec<RelationshipDescription>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipDescription {
    pub field: String,
    pub target: String,
    pub cardinality: Cardinality,
    pub join: JoinDescription,
}

/// `{ local: col }`, `{ remote: col }` or `{ through: table, local: col, remote: col }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinDescription {
    #[serde(default)]
    pub local: Option<String>,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub through: Option<String>,
}

impl JoinDescription {
    fn resolve(self, class_name: &str, field: &str) -> Result<Join> {
        match (self.through, self.local, self.remote) {
            (Some(table), Some(local), Some(remote)) => Ok(Join::Through {
                table,
                local,
                remote,
            }),
            (Some(_), _, _) => Err(ProjectionError::InvalidModel {
                reason: format!(
                    "{}.{}: a 'through' join needs both 'local' and 'remote' columns",
                    class_name, field
                ),
            }),
            (None, Some(column), None) => Ok(Join::Local { column }),
            (None, None, Some(column)) => Ok(Join::Remote { column }),
            _ => Err(ProjectionError::InvalidModel {
                reason: format!(
                    "{}.{}: join must name exactly one of 'local' or 'remote'",
                    class_name, field
                ),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Table rewrite pass
// ---------------------------------------------------------------------------

/// Post-load renaming of physical tables
///
/// `prefix` containing `{}` is used as a pattern for the lower-cased table
/// name (`"tgt_{}"`); without `{}` it is prepended. `schema` qualifies
/// every table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRewrite {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub schema: Option<String>,
}

impl TableRewrite {
    pub fn is_identity(&self) -> bool {
        self.prefix.is_empty() && self.schema.is_none()
    }

    pub fn rewrite_name(&self, table: &str) -> String {
        if self.prefix.is_empty() {
            table.to_string()
        } else if self.prefix.contains("{}") {
            self.prefix.replace("{}", &table.to_lowercase())
        } else {
            format!("{}{}", self.prefix, table.to_lowercase())
        }
    }
}

// ---------------------------------------------------------------------------
// Edge table
// ---------------------------------------------------------------------------

/// Validated edge table for every declared class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSchema {
    classes: BTreeMap<String, EntityClass>,
    schema: Option<String>,
}

impl ModelSchema {
    /// Build and validate the edge table from a description
    ///
    /// # Errors
    ///
    /// `InvalidModel` when an edge targets an undeclared class, a field
    /// name repeats within a class, or a join is malformed.
    pub fn from_description(description: ModelDescription) -> Result<Self> {
        let declared: HashSet<String> = description.classes.keys().cloned().collect();
        let mut classes = BTreeMap::new();

        for (name, class) in description.classes {
            let mut seen = HashSet::new();
            let mut edges = Vec::with_capacity(class.relationships.len());

            for rel in class.relationships {
                if !declared.contains(&rel.target) {
                    return Err(ProjectionError::InvalidModel {
                        reason: format!(
                            "{}.{} targets undeclared class '{}'",
                            name, rel.field, rel.target
                        ),
                    });
                }
                if !seen.insert(rel.field.clone()) {
                    return Err(ProjectionError::InvalidModel {
                        reason: format!("{} declares field '{}' twice", name, rel.field),
                    });
                }
                let join = rel.join.resolve(&name, &rel.field)?;
                edges.push(Edge {
                    field: rel.field,
                    target: rel.target,
                    cardinality: rel.cardinality,
                    join,
                });
            }

            let table = class.table.unwrap_or_else(|| name.clone());
            classes.insert(
                name.clone(),
                EntityClass {
                    name,
                    table,
                    primary_key: class.primary_key,
                    edges,
                },
            );
        }

        Ok(Self {
            classes,
            schema: None,
        })
    }

    /// Parse a YAML model description
    ///
    /// # Errors
    ///
    /// `Serialization` for malformed YAML, `InvalidModel` for an
    /// inconsistent edge table.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let description: ModelDescription = serde_yaml::from_str(content)?;
        Self::from_description(description)
    }

    /// Look up a class by exact name
    ///
    /// # Errors
    ///
    /// `UnknownClass` if the class is not declared.
    pub fn class(&self, name: &str) -> Result<&EntityClass> {
        self.classes
            .get(name)
            .ok_or_else(|| ProjectionError::UnknownClass {
                class_name: name.to_string(),
            })
    }

    /// Outgoing edges of a class, in declaration order
    ///
    /// # Errors
    ///
    /// `UnknownClass` if the class is not declared.
    pub fn edges(&self, name: &str) -> Result<&[Edge]> {
        Ok(&self.class(name)?.edges)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Classes sorted by name
    pub fn classes(&self) -> impl Iterator<Item = &EntityClass> {
        self.classes.values()
    }

    /// Schema qualifier applied by the last rewrite, if any
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Apply the table rewrite to every class table and association table
    ///
    /// Returns the `(original, rewritten)` pairs in class order so callers
    /// can report them.
    pub fn rewrite_tables(&mut self, rewrite: &TableRewrite) -> Vec<(String, String)> {
        let mut renamed = Vec::new();
        if rewrite.is_identity() {
            return renamed;
        }

        for class in self.classes.values_mut() {
            let new_name = rewrite.rewrite_name(&class.table);
            renamed.push((class.table.clone(), new_name.clone()));
            class.table = new_name;

            for edge in &mut class.edges {
                if let Join::Through { table, .. } = &mut edge.join {
                    let new_name = rewrite.rewrite_name(table);
                    renamed.push((table.clone(), new_name.clone()));
                    *table = new_name;
                }
            }
        }
        if rewrite.schema.is_some() {
            self.schema = rewrite.schema.clone();
        }

        renamed
    }
}
