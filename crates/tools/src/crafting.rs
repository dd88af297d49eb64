//! Crafting tools: `getRecipes`, `craftItem`.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::tool::{Tool, parse_args};
use mcremote_core::{Recipe, Session, ToolOutcome};
use serde::Deserialize;
use tracing::info;

#[derive(Deserialize)]
struct RecipesArgs {
    filter: Option<String>,
}

pub struct GetRecipesTool {
    session: Arc<Session>,
}

impl GetRecipesTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

/// Recipes grouped by output name, in first-seen order.
fn group_by_result(recipes: &[Recipe]) -> Vec<(&str, Vec<&Recipe>)> {
    let mut groups: Vec<(&str, Vec<&Recipe>)> = Vec::new();
    for recipe in recipes {
        match groups.iter_mut().find(|(name, _)| *name == recipe.result) {
            Some((_, members)) => members.push(recipe),
            None => groups.push((recipe.result.as_str(), vec![recipe])),
        }
    }
    groups
}

#[async_trait]
impl Tool for GetRecipesTool {
    fn name(&self) -> &str {
        "getRecipes"
    }

    fn description(&self) -> &str {
        "Get a list of available crafting recipes"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filter": { "type": "string", "description": "Filter recipes by item name" }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: RecipesArgs = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let filter = args.filter.filter(|f| !f.is_empty());
        let mut recipes = client.recipes();
        if let Some(filter) = &filter {
            let needle = filter.to_lowercase();
            recipes.retain(|r| r.result.to_lowercase().contains(&needle));
        }

        if recipes.is_empty() {
            return Ok(ToolOutcome::domain(match &filter {
                Some(f) => format!("No recipes found for \"{f}\"."),
                None => "No recipes available.".to_string(),
            }));
        }

        let mut out = match &filter {
            Some(f) => format!("Available recipes for \"{f}\":\n\n"),
            None => format!("Available recipes ({}):\n\n", recipes.len()),
        };
        for (result, members) in group_by_result(&recipes) {
            let plural = if members.len() > 1 { "s" } else { "" };
            let _ = writeln!(out, "{result} ({} recipe{plural}):", members.len());
            for (i, recipe) in members.iter().enumerate() {
                let _ = writeln!(out, "  Recipe {}:", i + 1);
                if !recipe.ingredients.is_empty() {
                    out.push_str("    Ingredients:\n");
                    for ing in &recipe.ingredients {
                        let _ = writeln!(out, "      - {} x{}", ing.name, ing.count.max(1));
                    }
                }
                out.push('\n');
            }
        }
        Ok(ToolOutcome::ok(out))
    }
}

pub struct CraftItemTool {
    session: Arc<Session>,
}

impl CraftItemTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

fn default_count() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CraftArgs {
    item_name: String,
    #[serde(default = "default_count")]
    count: u32,
}

#[async_trait]
impl Tool for CraftItemTool {
    fn name(&self) -> &str {
        "craftItem"
    }

    fn description(&self) -> &str {
        "Craft an item using available materials"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "itemName": { "type": "string", "description": "Name of the item to craft" },
                "count": {
                    "type": "integer",
                    "minimum": 1,
                    "default": 1,
                    "description": "Number of items to craft"
                }
            },
            "required": ["itemName"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: CraftArgs = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let Some(recipe) = client
            .recipes()
            .into_iter()
            .find(|r| r.result.eq_ignore_ascii_case(&args.item_name))
        else {
            return Ok(ToolOutcome::domain(format!(
                "No recipes found for \"{}\" or insufficient materials.",
                args.item_name
            )));
        };

        if let Err(e) = client.craft(&recipe, args.count).await {
            return Ok(e.into());
        }
        info!(item = %recipe.result, count = args.count, "Crafted");
        Ok(ToolOutcome::ok(format!(
            "Successfully crafted {} x {}",
            args.count, args.item_name
        )))
    }
}
