//! Product-master column role inference.
//!
//! Each role is tested, in rule-table order, against the headers in their
//! original order; the first matching header wins. A header may serve more
//! than one role. Resolution never fails: roles without a match are simply
//! absent from the returned map.

use std::collections::BTreeMap;

use crate::config::{MatchRule, RoleRule};
use crate::model::{ColumnRoleMap, ResolvedColumn};

pub fn resolve_roles(headers: &[String], rules: &[RoleRule]) -> ColumnRoleMap {
    let folded: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut columns = BTreeMap::new();

    for rule in rules {
        if columns.contains_key(&rule.role) {
            continue;
        }
        let patterns: Vec<String> = rule
            .patterns
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        if patterns.is_empty() {
            continue;
        }

        if let Some(index) = folded.iter().position(|h| header_matches(h, rule.rule, &patterns)) {
            log::debug!("master role '{}' -> column '{}'", rule.role, headers[index]);
            columns.insert(
                rule.role,
                ResolvedColumn {
                    name: headers[index].clone(),
                    index,
                },
            );
        }
    }

    ColumnRoleMap::from_resolved(columns)
}

fn header_matches(header: &str, rule: MatchRule, patterns: &[String]) -> bool {
    match rule {
        MatchRule::Exact => header == patterns[0],
        MatchRule::Contains => header.contains(patterns[0].as_str()),
        MatchRule::ContainsAll => patterns.iter().all(|p| header.contains(p.as_str())),
        MatchRule::OneOf => patterns.iter().any(|p| header == p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_role_rules;
    use crate::model::Role;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_typical_purchase_master() {
        let h = headers(&[
            "EasycomSKU",
            "Brand Manager",
            "Brand",
            "Product Name",
            "FNS",
            "Vendor SKU Code",
            "Cost Price",
        ]);
        let map = resolve_roles(&h, &default_role_rules());
        assert_eq!(map.get(Role::Sku).unwrap().name, "EasycomSKU");
        assert_eq!(map.get(Role::Manager).unwrap().index, 1);
        assert_eq!(map.get(Role::Brand).unwrap().index, 2);
        assert_eq!(map.get(Role::ProductName).unwrap().index, 3);
        assert_eq!(map.get(Role::Fns).unwrap().index, 4);
        assert_eq!(map.get(Role::VendorSku).unwrap().index, 5);
        assert_eq!(map.get(Role::Cp).unwrap().name, "Cost Price");
        assert!(map.absent_roles().is_empty());
    }

    #[test]
    fn brand_requires_exact_header() {
        // "Brand Manager" must not satisfy the exact "brand" rule
        let h = headers(&["easycomsku", "Brand Manager"]);
        let map = resolve_roles(&h, &default_role_rules());
        assert!(!map.is_resolved(Role::Brand));
        assert!(map.is_resolved(Role::Manager));
    }

    #[test]
    fn first_matching_header_wins() {
        let h = headers(&["Easycomsku Old", "EasycomSKU"]);
        let map = resolve_roles(&h, &default_role_rules());
        assert_eq!(map.get(Role::Sku).unwrap().index, 0);
    }

    #[test]
    fn missing_roles_are_absent_not_errors() {
        let h = headers(&["Item", "Qty"]);
        let map = resolve_roles(&h, &default_role_rules());
        assert_eq!(map.absent_roles().len(), Role::ALL.len());
        assert!(map.get(Role::Sku).is_none());
    }

    #[test]
    fn cp_synonyms_match_exactly() {
        let rules = default_role_rules();
        assert!(resolve_roles(&headers(&["COST"]), &rules).is_resolved(Role::Cp));
        assert!(resolve_roles(&headers(&[" cp "]), &rules).is_resolved(Role::Cp));
        assert!(!resolve_roles(&headers(&["Cost Centre"]), &rules).is_resolved(Role::Cp));
    }

    #[test]
    fn override_patterns_are_case_insensitive() {
        let rules = vec![RoleRule::new(Role::Sku, MatchRule::Exact, &["Item Code"])];
        let map = resolve_roles(&headers(&["name", "ITEM CODE"]), &rules);
        assert_eq!(map.get(Role::Sku).unwrap().index, 1);
    }
}
