use serde::Serialize;
use serde_json::Value;

use crate::smarthome::{require_items, SmartHome};
use crate::utils::errors::Result;

pub const NO_SCENES: &str = "No scenes available";
pub const SCENES_RUN: &str = "Scene executed successfully";

#[derive(Serialize)]
struct GetScenesParams<'a> {
    positions: &'a [String],
}

#[derive(Serialize)]
struct RunScenesParams<'a> {
    scenes: &'a [i64],
}

impl SmartHome {
    /// Scenes (control buttons) for the given positions; all positions when empty.
    /// Returns the cloud's Markdown listing.
    pub async fn get_scenes(&self, positions: &[String]) -> Result<String> {
        let result: Option<String> = self.call("GetScenes", &GetScenesParams { positions }).await?;
        Ok(result.unwrap_or_else(|| NO_SCENES.to_string()))
    }

    pub async fn run_scenes(&self, scenes: &[i64]) -> Result<()> {
        require_items(scenes, "Scene list cannot be empty")?;
        let _: Option<Value> = self.call("RunScenes", &RunScenesParams { scenes }).await?;
        Ok(())
    }
}
