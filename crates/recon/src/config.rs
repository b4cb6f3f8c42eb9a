use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::Role;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Only orders whose marketplace equals this literal count as sales.
    #[serde(default = "default_marketplace")]
    pub marketplace: String,
    #[serde(default)]
    pub keys: KeyConfig,
    #[serde(default)]
    pub orders: OrderColumns,
    #[serde(default)]
    pub inventory: InventoryColumns,
    /// Per-role overrides of the built-in matching rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<RoleRule>,
}

fn default_name() -> String {
    "Flipkart QWTT".into()
}

fn default_marketplace() -> String {
    "Flipkart".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            marketplace: default_marketplace(),
            keys: KeyConfig::default(),
            orders: OrderColumns::default(),
            inventory: InventoryColumns::default(),
            roles: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Key normalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyConfig {
    /// Every character in this string is removed from SKU keys.
    #[serde(default = "default_strip_chars")]
    pub strip_chars: String,
    #[serde(default = "default_true")]
    pub case_fold: bool,
}

fn default_strip_chars() -> String {
    "`".into()
}

fn default_true() -> bool {
    true
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            strip_chars: default_strip_chars(),
            case_fold: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Required input columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderColumns {
    #[serde(default = "default_order_marketplace")]
    pub marketplace: String,
    #[serde(default = "default_order_sku")]
    pub sku: String,
    #[serde(default = "default_order_quantity")]
    pub quantity: String,
}

fn default_order_marketplace() -> String {
    "Marketplace".into()
}

fn default_order_sku() -> String {
    "SKU".into()
}

fn default_order_quantity() -> String {
    "Quantity".into()
}

impl Default for OrderColumns {
    fn default() -> Self {
        Self {
            marketplace: default_order_marketplace(),
            sku: default_order_sku(),
            quantity: default_order_quantity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InventoryColumns {
    #[serde(default = "default_inventory_sku")]
    pub sku: String,
    #[serde(default = "default_inventory_quantity")]
    pub quantity: String,
}

fn default_inventory_sku() -> String {
    "sku".into()
}

fn default_inventory_quantity() -> String {
    "old_quantity".into()
}

impl Default for InventoryColumns {
    fn default() -> Self {
        Self {
            sku: default_inventory_sku(),
            quantity: default_inventory_quantity(),
        }
    }
}

// ---------------------------------------------------------------------------
// Role matching rules
// ---------------------------------------------------------------------------

/// How a master header is tested against a role's patterns. All comparisons
/// are on the trimmed, lowercased header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Header equals the single pattern.
    Exact,
    /// Header contains the single pattern.
    Contains,
    /// Header contains every pattern.
    ContainsAll,
    /// Header equals any pattern.
    OneOf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleRule {
    pub role: Role,
    pub rule: MatchRule,
    pub patterns: Vec<String>,
}

impl RoleRule {
    pub fn new(role: Role, rule: MatchRule, patterns: &[&str]) -> Self {
        Self {
            role,
            rule,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// The built-in rule table, evaluated in this order.
pub fn default_role_rules() -> Vec<RoleRule> {
    vec![
        RoleRule::new(Role::Sku, MatchRule::Contains, &["easycomsku"]),
        RoleRule::new(Role::Manager, MatchRule::Contains, &["brand manager"]),
        RoleRule::new(Role::Brand, MatchRule::Exact, &["brand"]),
        RoleRule::new(Role::ProductName, MatchRule::ContainsAll, &["product", "name"]),
        RoleRule::new(Role::Fns, MatchRule::Contains, &["fns"]),
        RoleRule::new(Role::VendorSku, MatchRule::ContainsAll, &["vendor", "sku"]),
        RoleRule::new(Role::Cp, MatchRule::OneOf, &["cp", "cost", "cost price"]),
    ]
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.marketplace.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "marketplace must not be empty".into(),
            ));
        }

        let required = [
            ("orders.marketplace", &self.orders.marketplace),
            ("orders.sku", &self.orders.sku),
            ("orders.quantity", &self.orders.quantity),
            ("inventory.sku", &self.inventory.sku),
            ("inventory.quantity", &self.inventory.quantity),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "{key} must name a column"
                )));
            }
        }

        let mut seen = HashSet::new();
        for rule in &self.roles {
            if !seen.insert(rule.role) {
                return Err(ReconError::ConfigValidation(format!(
                    "role '{}' is overridden more than once",
                    rule.role
                )));
            }
            if rule.patterns.iter().all(|p| p.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "role '{}': at least one pattern is required",
                    rule.role
                )));
            }
            if matches!(rule.rule, MatchRule::Exact | MatchRule::Contains) && rule.patterns.len() > 1 {
                return Err(ReconError::ConfigValidation(format!(
                    "role '{}': rule '{:?}' takes exactly one pattern, got {}",
                    rule.role,
                    rule.rule,
                    rule.patterns.len()
                )));
            }
        }

        Ok(())
    }

    /// Built-in rules with any configured overrides swapped in, order preserved.
    pub fn role_rules(&self) -> Vec<RoleRule> {
        default_role_rules()
            .into_iter()
            .map(|default| {
                self.roles
                    .iter()
                    .find(|o| o.role == default.role)
                    .cloned()
                    .unwrap_or(default)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.marketplace, "Flipkart");
        assert_eq!(config.keys.strip_chars, "`");
        assert!(config.keys.case_fold);
        assert_eq!(config.orders.quantity, "Quantity");
        assert_eq!(config.inventory.quantity, "old_quantity");
        assert_eq!(config.role_rules(), default_role_rules());
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
name = "Amazon weekly"
marketplace = "Amazon"

[keys]
strip_chars = "`'"
case_fold = false

[orders]
sku = "Seller SKU"

[inventory]
quantity = "qty"

[[roles]]
role = "cp"
rule = "one_of"
patterns = ["cp", "landing cost"]
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.name, "Amazon weekly");
        assert_eq!(config.marketplace, "Amazon");
        assert_eq!(config.keys.strip_chars, "`'");
        assert!(!config.keys.case_fold);
        assert_eq!(config.orders.sku, "Seller SKU");
        assert_eq!(config.orders.marketplace, "Marketplace");
        assert_eq!(config.inventory.quantity, "qty");

        let rules = config.role_rules();
        assert_eq!(rules.len(), 7);
        let cp = rules.iter().find(|r| r.role == Role::Cp).unwrap();
        assert_eq!(cp.patterns, vec!["cp", "landing cost"]);
        // Order of the table is unchanged
        assert_eq!(rules[0].role, Role::Sku);
    }

    #[test]
    fn reject_empty_marketplace() {
        let err = ReconConfig::from_toml("marketplace = \"  \"").unwrap_err();
        assert!(err.to_string().contains("marketplace must not be empty"));
    }

    #[test]
    fn reject_duplicate_role_override() {
        let input = r#"
[[roles]]
role = "brand"
rule = "exact"
patterns = ["brand"]

[[roles]]
role = "brand"
rule = "contains"
patterns = ["brand"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn reject_exact_with_many_patterns() {
        let input = r#"
[[roles]]
role = "brand"
rule = "exact"
patterns = ["brand", "make"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("exactly one pattern"));
    }

    #[test]
    fn reject_unknown_rule() {
        let input = r#"
[[roles]]
role = "brand"
rule = "fuzzy"
patterns = ["brand"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn default_round_trips_through_toml() {
        let text = ReconConfig::default().to_toml().unwrap();
        let back = ReconConfig::from_toml(&text).unwrap();
        assert_eq!(back.marketplace, "Flipkart");
        assert_eq!(back.inventory.sku, "sku");
    }
}
