use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Plantilla ya validada.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Template {
    pub min_version: Option<String>,
    pub description: Option<String>,
    /// Por nombre; el nombre por defecto es el tipo.
    pub builders: BTreeMap<String, Builder>,
    pub provisioners: Vec<Provisioner>,
    pub post_processors: Vec<Value>,
    pub push: Option<Map<String, Value>>,
    pub variables: Map<String, Value>,
}

impl Template {
    pub fn builder(&self, name: &str) -> Option<&Builder> {
        self.builders.get(name)
    }

    /// Builders de un tipo dado, ordenados por nombre.
    pub fn builders_of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Builder> + 'a {
        self.builders.values().filter(move |b| b.kind == kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Builder {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Claves restantes, sin `name` ni `type`.
    pub config: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Provisioner {
    #[serde(rename = "type")]
    pub kind: String,
    pub only: Vec<String>,
    pub except: Vec<String>,
    #[serde(rename = "override")]
    pub overrides: Map<String, Value>,
    pub pause_before: Option<String>,
    pub config: Map<String, Value>,
}

impl Provisioner {
    /// Si el provisioner aplica al builder `name` según `only` / `except`.
    pub fn applies_to(&self, name: &str) -> bool {
        if !self.only.is_empty() {
            return self.only.iter().any(|n| n == name);
        }
        !self.except.iter().any(|n| n == name)
    }
}
