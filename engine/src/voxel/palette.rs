use serde::{Deserialize, Serialize};

use super::types::MaterialId;

/// One entry of the game's material catalog, as much of it as the engine
/// cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDef {
    pub id: MaterialId,
    pub name: String,
    #[serde(default)]
    pub is_ore: bool,
}

impl MaterialDef {
    pub fn new(id: MaterialId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_ore: false,
        }
    }
}

/// Material id lookup handed into the engine by the application. Supplies
/// the default/fallback id used for never-written cells and unspecified
/// sphere materials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialPalette {
    materials: Vec<MaterialDef>,
    default_id: MaterialId,
}

impl MaterialPalette {
    pub fn new(default_id: MaterialId) -> Self {
        Self {
            materials: Vec::new(),
            default_id,
        }
    }

    pub fn with_materials(materials: Vec<MaterialDef>, default_id: MaterialId) -> Self {
        Self {
            materials,
            default_id,
        }
    }

    pub fn default_material(&self) -> MaterialId {
        self.default_id
    }

    /// The given id when present, the palette default otherwise.
    pub fn resolve(&self, choice: Option<MaterialId>) -> MaterialId {
        choice.unwrap_or(self.default_id)
    }

    pub fn get(&self, id: MaterialId) -> Option<&MaterialDef> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn name_of(&self, id: MaterialId) -> Option<&str> {
        self.get(id).map(|m| m.name.as_str())
    }

    /// Insert a definition, replacing any existing entry with the same id.
    pub fn register(&mut self, def: MaterialDef) {
        match self.materials.iter_mut().find(|m| m.id == def.id) {
            Some(existing) => *existing = def,
            None => self.materials.push(def),
        }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for MaterialPalette {
    fn default() -> Self {
        Self {
            materials: vec![MaterialDef::new(MaterialId(0), "Stone")],
            default_id: MaterialId(0),
        }
    }
}
