use crate::geometry::ids::ToolId;
use crate::types::Tool;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted pool of clearing tools stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolTable {
    pub tools: Vec<Tool>,
}

impl ToolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Load a table from the provided path. Missing files yield an empty table.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::new());
        }

        let data = fs::read(path).with_context(|| format!("read tool table {}", path.display()))?;
        let table: ToolTable = serde_json::from_slice(&data).context("deserialize tool table")?;
        Ok(table)
    }

    /// Persist the table to the provided path, ensuring the directory exists.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create tool table directory {}", parent.display()))?;
        }

        let data = serde_json::to_vec_pretty(self).context("serialize tool table to JSON bytes")?;
        fs::write(path, data).with_context(|| format!("write tool table {}", path.display()))
    }

    /// Append a new tool to the table.
    pub fn add_tool(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    pub fn find_tool(&self, id: ToolId) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.id == id)
    }

    /// Replace the tool carrying the provided id. The id itself never changes.
    pub fn update_tool(&mut self, id: ToolId, mut tool: Tool) -> Result<()> {
        let slot = self
            .tools
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| anyhow!("unknown tool id {id}"))?;
        tool.id = id;
        *slot = tool;
        Ok(())
    }

    /// Remove the tool carrying the provided id.
    pub fn remove_tool(&mut self, id: ToolId) -> Result<()> {
        let index = self
            .tools
            .iter()
            .position(|tool| tool.id == id)
            .ok_or_else(|| anyhow!("unknown tool id {id}"))?;
        self.tools.remove(index);
        Ok(())
    }

    /// Resolve the default table path (`~/.rubout/tools.json`), creating directories.
    pub fn default_table_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
        let path = home.join(".rubout").join("tools.json");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create tool table directory {}", parent.display()))?;
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClearMethod, ToolRole};

    #[test]
    fn test_round_trip_preserves_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.json");

        let mut table = ToolTable::new();
        table.add_tool(
            Tool::new("coarse", 2.0)
                .with_method(ClearMethod::Combo)
                .with_overlap(0.35),
        );
        table.add_tool(Tool::new("iso", 0.3).with_role(ToolRole::Isolation));
        table.save_to_path(&path).unwrap();

        let loaded = ToolTable::load_from_path(&path).unwrap();
        assert_eq!(loaded.tools.len(), 2);
        assert_eq!(loaded.tools[0].id, table.tools[0].id);
        assert_eq!(loaded.tools[0].name, "coarse");
        assert_eq!(loaded.tools[1].role, ToolRole::Isolation);
    }

    #[test]
    fn test_missing_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = ToolTable::load_from_path(dir.path().join("absent.json")).unwrap();
        assert!(table.tools.is_empty());
    }

    #[test]
    fn test_update_keeps_id() {
        let mut table = ToolTable::new();
        table.add_tool(Tool::new("old", 1.0));
        let id = table.tools[0].id;

        table.update_tool(id, Tool::new("new", 1.5)).unwrap();
        assert_eq!(table.tools[0].id, id);
        assert_eq!(table.tools[0].name, "new");
        assert_eq!(table.tools[0].diameter, 1.5);
    }

    #[test]
    fn test_unknown_id_is_an_error() {
        let mut table = ToolTable::new();
        table.add_tool(Tool::new("only", 1.0));
        assert!(table.update_tool(ToolId::new(), Tool::new("x", 2.0)).is_err());
        assert!(table.remove_tool(ToolId::new()).is_err());
        assert_eq!(table.tools.len(), 1);
    }

    #[test]
    fn test_remove_by_id() {
        let mut table = ToolTable::new();
        table.add_tool(Tool::new("a", 1.0));
        table.add_tool(Tool::new("b", 2.0));
        let id = table.tools[0].id;
        table.remove_tool(id).unwrap();
        assert_eq!(table.tools.len(), 1);
        assert_eq!(table.tools[0].name, "b");
        assert!(table.find_tool(id).is_none());
    }
}
