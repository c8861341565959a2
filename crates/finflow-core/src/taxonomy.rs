//! Category taxonomy
//!
//! The closed set of categories a transaction may carry, split by kind,
//! plus the category → icon map, the ordered keyword rules used by the
//! deterministic classifier and the alias table used to reconcile free-form
//! answers from the remote classifier.
//!
//! Everything is checked once in [`Taxonomy::new`]; after that the taxonomy is
//! read-only and can be shared between tasks.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::models::TransactionType;

/// Catch-all for expenses
pub const OTHER_EXPENSE: &str = "Other";
/// Catch-all for income
pub const OTHER_INCOME: &str = "Other Income";
/// Icon used by both catch-alls and unknown categories
pub const OTHER_ICON: &str = "other";

/// Default expense categories, in display order
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food and Drink",
    "Transport",
    "Leisure",
    "Home",
    "Health",
    "Pets",
    "Gifts",
    "Education",
    "Shopping",
    OTHER_EXPENSE,
];

/// Default income categories, in display order
pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Investments",
    "Business",
    "Honorarios Profesionales",
    "Gifts Received",
    OTHER_INCOME,
];

const CATEGORY_ICONS: &[(&str, &str)] = &[
    ("Food and Drink", "food"),
    ("Transport", "transport"),
    ("Leisure", "leisure"),
    ("Home", "home"),
    ("Health", "health"),
    ("Pets", "pets"),
    ("Gifts", "gifts"),
    ("Education", "education"),
    ("Shopping", "shopping"),
    (OTHER_EXPENSE, OTHER_ICON),
    ("Salary", "salary"),
    ("Investments", "investment"),
    ("Business", "business"),
    ("Honorarios Profesionales", "professional"),
    ("Gifts Received", "gifts"),
    (OTHER_INCOME, OTHER_ICON),
];

/// (kind, keywords, category, subcategory)
///
/// Order matters: the first rule with a matching keyword wins, so specific
/// phrases sit above the generic ones they contain ("uber eats" before "uber").
type RuleRow = (
    TransactionType,
    &'static [&'static str],
    &'static str,
    Option<&'static str>,
);

const KEYWORD_RULES: &[RuleRow] = &[
    // Expenses
    (
        TransactionType::Expense,
        &["uber eats", "ubereats", "glovo", "deliveroo", "doordash", "just eat", "rappi"],
        "Food and Drink",
        Some("Delivery"),
    ),
    (
        TransactionType::Expense,
        &[
            "restaurant", "restaurante", "dinner", "cena", "lunch", "almuerzo", "cafe",
            "café", "coffee", "starbucks", "mcdonald", "burger", "pizza",
        ],
        "Food and Drink",
        Some("Restaurants"),
    ),
    (
        TransactionType::Expense,
        &[
            "supermarket", "supermercado", "grocery", "groceries", "mercadona", "carrefour",
            "lidl", "walmart",
        ],
        "Food and Drink",
        Some("Groceries"),
    ),
    (
        TransactionType::Expense,
        &["uber", "cabify", "lyft", "taxi", "didi"],
        "Transport",
        Some("Ride share"),
    ),
    (
        TransactionType::Expense,
        &["gas station", "gasolina", "fuel", "petrol", "repsol"],
        "Transport",
        Some("Fuel"),
    ),
    (
        TransactionType::Expense,
        &["metro", "subway", "train ticket", "renfe", "bus fare"],
        "Transport",
        Some("Public transit"),
    ),
    (
        TransactionType::Expense,
        &["parking", "toll", "peaje"],
        "Transport",
        Some("Parking & tolls"),
    ),
    (
        TransactionType::Expense,
        &["netflix", "spotify", "hbo", "disney+", "prime video"],
        "Leisure",
        Some("Streaming"),
    ),
    (
        TransactionType::Expense,
        &["cinema", "movie", "concert", "steam", "theatre", "theater"],
        "Leisure",
        Some("Entertainment"),
    ),
    (
        TransactionType::Expense,
        &[
            "alquiler", "rent payment", "monthly rent", "mortgage", "hipoteca", "electricity",
            "electric bill", "water bill", "internet", "ikea",
        ],
        "Home",
        None,
    ),
    (
        TransactionType::Expense,
        &["pharmacy", "farmacia", "doctor", "dentist", "hospital", "clinic", "gym"],
        "Health",
        None,
    ),
    (
        TransactionType::Expense,
        &["veterinar", "pet food", "pet shop", "mascota", "dog food", "cat food"],
        "Pets",
        None,
    ),
    (
        TransactionType::Expense,
        &["gift", "regalo", "donation", "donación"],
        "Gifts",
        None,
    ),
    (
        TransactionType::Expense,
        &["course", "curso", "udemy", "tuition", "colegiatura", "textbook", "bookstore", "librería"],
        "Education",
        None,
    ),
    (
        TransactionType::Expense,
        &["amazon", "zara", "clothes", "ropa", "h&m"],
        "Shopping",
        None,
    ),
    // Income
    (
        TransactionType::Income,
        &["salary", "payroll", "nómina", "nomina", "sueldo", "paycheck", "wage"],
        "Salary",
        None,
    ),
    (
        TransactionType::Income,
        &["dividend", "interest", "crypto", "rendimiento"],
        "Investments",
        None,
    ),
    (
        TransactionType::Income,
        &["venta", "sales revenue"],
        "Business",
        None,
    ),
    (
        TransactionType::Income,
        &["honorarios", "freelance", "invoice", "factura"],
        "Honorarios Profesionales",
        None,
    ),
    (
        TransactionType::Income,
        &["gift", "regalo"],
        "Gifts Received",
        None,
    ),
];

/// Phrases the remote classifier tends to answer with instead of the exact name
const ALIASES: &[(TransactionType, &str, &str)] = &[
    (TransactionType::Expense, "groceries", "Food and Drink"),
    (TransactionType::Expense, "restaurants", "Food and Drink"),
    (TransactionType::Expense, "dining", "Food and Drink"),
    (TransactionType::Expense, "transportation", "Transport"),
    (TransactionType::Expense, "entertainment", "Leisure"),
    (TransactionType::Expense, "housing", "Home"),
    (TransactionType::Expense, "utilities", "Home"),
    (TransactionType::Expense, "rent", "Home"),
    (TransactionType::Expense, "healthcare", "Health"),
    (TransactionType::Expense, "medical", "Health"),
    (TransactionType::Expense, "clothing", "Shopping"),
    (TransactionType::Income, "professional fees", "Honorarios Profesionales"),
    (TransactionType::Income, "professional services", "Honorarios Profesionales"),
    (TransactionType::Income, "consulting", "Honorarios Profesionales"),
    (TransactionType::Income, "freelance", "Honorarios Profesionales"),
    (TransactionType::Income, "wages", "Salary"),
    (TransactionType::Income, "payroll", "Salary"),
    (TransactionType::Income, "dividends", "Investments"),
    (TransactionType::Income, "interest", "Investments"),
    (TransactionType::Income, "gifts", "Gifts Received"),
];

/// An ordered keyword rule for the deterministic classifier
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule {
    pub kind: TransactionType,
    /// Lowercase substrings; any one matching fires the rule
    pub keywords: Vec<String>,
    pub category: String,
    pub sub_category: Option<String>,
}

impl KeywordRule {
    /// Whether any keyword occurs in an already-normalized description
    pub fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalized.contains(k.as_str()))
    }
}

/// Maps an alternative phrase to a canonical category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAlias {
    pub kind: TransactionType,
    pub phrase: String,
    pub category: String,
}

/// Raw taxonomy definition, checked by [`Taxonomy::new`]
#[derive(Debug, Clone, Default)]
pub struct TaxonomyDefinition {
    pub expense_categories: Vec<String>,
    pub income_categories: Vec<String>,
    pub icons: Vec<(String, String)>,
    pub rules: Vec<KeywordRule>,
    pub aliases: Vec<CategoryAlias>,
}

impl TaxonomyDefinition {
    /// The built-in category set
    pub fn builtin() -> Self {
        Self {
            expense_categories: EXPENSE_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            income_categories: INCOME_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            icons: CATEGORY_ICONS
                .iter()
                .map(|(c, i)| (c.to_string(), i.to_string()))
                .collect(),
            rules: KEYWORD_RULES
                .iter()
                .map(|(kind, keywords, category, sub)| KeywordRule {
                    kind: *kind,
                    keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
                    category: category.to_string(),
                    sub_category: sub.map(|s| s.to_string()),
                })
                .collect(),
            aliases: ALIASES
                .iter()
                .map(|(kind, phrase, category)| CategoryAlias {
                    kind: *kind,
                    phrase: phrase.to_lowercase(),
                    category: category.to_string(),
                })
                .collect(),
        }
    }
}

/// Validated, immutable category registry
#[derive(Debug, Clone)]
pub struct Taxonomy {
    expense: Vec<String>,
    income: Vec<String>,
    icons: HashMap<String, String>,
    rules: Vec<KeywordRule>,
    aliases: Vec<CategoryAlias>,
}

impl Taxonomy {
    /// Build a taxonomy, checking that it is internally consistent
    ///
    /// Keywords and alias phrases are trimmed and lowercased here, so custom
    /// definitions match the same way the built-in one does.
    pub fn new(def: TaxonomyDefinition) -> Result<Self> {
        let icons: HashMap<String, String> = def.icons.into_iter().collect();
        let rules: Vec<KeywordRule> = def
            .rules
            .into_iter()
            .map(|mut rule| {
                for keyword in &mut rule.keywords {
                    *keyword = keyword.trim().to_lowercase();
                }
                rule
            })
            .collect();
        let aliases: Vec<CategoryAlias> = def
            .aliases
            .into_iter()
            .map(|mut alias| {
                alias.phrase = alias.phrase.trim().to_lowercase();
                alias
            })
            .collect();

        check_list(&def.expense_categories, OTHER_EXPENSE, &icons)?;
        check_list(&def.income_categories, OTHER_INCOME, &icons)?;

        let list_for = |kind: TransactionType| match kind {
            TransactionType::Expense => &def.expense_categories,
            TransactionType::Income => &def.income_categories,
        };

        for rule in &rules {
            if !list_for(rule.kind).contains(&rule.category) {
                return Err(Error::Config(format!(
                    "rule targets '{}', which is not a {} category",
                    rule.category, rule.kind
                )));
            }
            if rule.keywords.is_empty() || rule.keywords.iter().any(String::is_empty) {
                return Err(Error::Config(format!(
                    "rule for '{}' has an empty keyword",
                    rule.category
                )));
            }
        }

        for alias in &aliases {
            if !list_for(alias.kind).contains(&alias.category) {
                return Err(Error::Config(format!(
                    "alias '{}' targets '{}', which is not a {} category",
                    alias.phrase, alias.category, alias.kind
                )));
            }
        }

        Ok(Self {
            expense: def.expense_categories,
            income: def.income_categories,
            icons,
            rules,
            aliases,
        })
    }

    /// The built-in taxonomy, shared for the life of the process
    pub fn standard() -> &'static Taxonomy {
        static STANDARD: OnceLock<Taxonomy> = OnceLock::new();
        STANDARD.get_or_init(|| {
            Taxonomy::new(TaxonomyDefinition::builtin())
                .expect("built-in taxonomy is consistent (checked by tests)")
        })
    }

    /// Category names allowed for a kind, in display order
    pub fn categories(&self, kind: TransactionType) -> &[String] {
        match kind {
            TransactionType::Expense => &self.expense,
            TransactionType::Income => &self.income,
        }
    }

    /// Borrowed view of [`Self::categories`], handy for prompts and matching
    pub fn allowed(&self, kind: TransactionType) -> Vec<&str> {
        self.categories(kind).iter().map(String::as_str).collect()
    }

    pub fn is_allowed(&self, kind: TransactionType, category: &str) -> bool {
        self.categories(kind).iter().any(|c| c == category)
    }

    /// Icon for a category; unknown names get the catch-all icon
    pub fn icon_for(&self, category: &str) -> &str {
        self.icons
            .get(category)
            .map(String::as_str)
            .unwrap_or(OTHER_ICON)
    }

    pub fn fallback_category(&self, kind: TransactionType) -> &'static str {
        match kind {
            TransactionType::Expense => OTHER_EXPENSE,
            TransactionType::Income => OTHER_INCOME,
        }
    }

    /// Keyword rules for a kind, in evaluation order
    pub fn rules(&self, kind: TransactionType) -> impl Iterator<Item = &KeywordRule> {
        self.rules.iter().filter(move |r| r.kind == kind)
    }

    /// Canonical category for a known alternative phrase (exact, case-insensitive)
    pub fn resolve_alias(&self, response: &str, kind: TransactionType) -> Option<&str> {
        let needle = response.trim().to_lowercase();
        self.aliases
            .iter()
            .find(|a| a.kind == kind && a.phrase == needle)
            .map(|a| a.category.as_str())
    }

    /// Map a free-form answer onto an allowed category: alias table, then best match
    pub fn reconcile(&self, response: &str, kind: TransactionType) -> Option<&str> {
        if let Some(category) = self.resolve_alias(response, kind) {
            return Some(category);
        }
        let allowed = self.allowed(kind);
        best_match(response, &allowed)
    }
}

fn check_list(list: &[String], catch_all: &str, icons: &HashMap<String, String>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in list {
        if name.trim().is_empty() {
            return Err(Error::Config("empty category name".into()));
        }
        if !seen.insert(name.as_str()) {
            return Err(Error::Config(format!("duplicate category '{}'", name)));
        }
        if !icons.contains_key(name) {
            return Err(Error::Config(format!("category '{}' has no icon", name)));
        }
    }
    if !seen.contains(catch_all) {
        return Err(Error::Config(format!(
            "category list is missing its catch-all '{}'",
            catch_all
        )));
    }
    Ok(())
}

/// Find the allowed category a free-form answer refers to
///
/// Exact (case-insensitive) match first; otherwise the first allowed name that
/// contains the answer or is contained in it. Returns `None` when nothing
/// relates, so foreign-language or invented names never slip through.
pub fn best_match<'a>(response: &str, allowed: &[&'a str]) -> Option<&'a str> {
    let needle = response.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) = allowed.iter().copied().find(|c| c.to_lowercase() == needle) {
        return Some(exact);
    }

    allowed.iter().copied().find(|c| {
        let candidate = c.to_lowercase();
        candidate.contains(&needle) || needle.contains(&candidate)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleClassifier;

    #[test]
    fn test_builtin_taxonomy_is_valid() {
        Taxonomy::new(TaxonomyDefinition::builtin()).unwrap();
        let taxonomy = Taxonomy::standard();
        assert_eq!(taxonomy.categories(TransactionType::Expense).len(), 10);
        assert_eq!(taxonomy.categories(TransactionType::Income).len(), 6);
    }

    #[test]
    fn test_every_category_has_icon() {
        let taxonomy = Taxonomy::standard();
        for kind in [TransactionType::Expense, TransactionType::Income] {
            for category in taxonomy.categories(kind) {
                assert!(taxonomy.icons.contains_key(category), "{}", category);
            }
        }
        assert_eq!(taxonomy.icon_for("Honorarios Profesionales"), "professional");
        assert_eq!(taxonomy.icon_for("Nonexistent"), OTHER_ICON);
    }

    #[test]
    fn test_best_match() {
        let allowed = EXPENSE_CATEGORIES;
        assert_eq!(best_match("food and drink", allowed), Some("Food and Drink"));
        assert_eq!(best_match("Food", allowed), Some("Food and Drink"));
        assert_eq!(best_match("Transport > Taxi", allowed), Some("Transport"));
        assert_eq!(best_match("Comida", allowed), None);
        assert_eq!(best_match("", allowed), None);
        assert_eq!(best_match("   ", allowed), None);
    }

    #[test]
    fn test_reconcile_prefers_alias() {
        let taxonomy = Taxonomy::standard();
        assert_eq!(
            taxonomy.reconcile("Professional Fees", TransactionType::Income),
            Some("Honorarios Profesionales")
        );
        assert_eq!(
            taxonomy.reconcile("Groceries", TransactionType::Expense),
            Some("Food and Drink")
        );
        assert_eq!(taxonomy.reconcile("Comida", TransactionType::Expense), None);
        // Aliases are scoped by kind
        assert_eq!(
            taxonomy.resolve_alias("professional fees", TransactionType::Expense),
            None
        );
    }

    #[test]
    fn test_rule_must_target_own_kind() {
        let mut def = TaxonomyDefinition::builtin();
        def.rules.push(KeywordRule {
            kind: TransactionType::Expense,
            keywords: vec!["bonus".into()],
            category: "Salary".into(),
            sub_category: None,
        });
        assert!(Taxonomy::new(def).is_err());
    }

    #[test]
    fn test_missing_catch_all_rejected() {
        let mut def = TaxonomyDefinition::builtin();
        def.income_categories.retain(|c| c != OTHER_INCOME);
        assert!(Taxonomy::new(def).is_err());
    }

    #[test]
    fn test_duplicate_and_iconless_rejected() {
        let mut def = TaxonomyDefinition::builtin();
        def.expense_categories.push("Transport".into());
        assert!(Taxonomy::new(def).is_err());

        let mut def = TaxonomyDefinition::builtin();
        def.expense_categories.insert(0, "Travel".into());
        assert!(Taxonomy::new(def).is_err());
    }

    #[test]
    fn test_alias_must_target_own_kind() {
        let mut def = TaxonomyDefinition::builtin();
        def.aliases.push(CategoryAlias {
            kind: TransactionType::Income,
            phrase: "dining".into(),
            category: "Food and Drink".into(),
        });
        assert!(Taxonomy::new(def).is_err());
    }

    #[test]
    fn test_custom_keywords_match_case_insensitively() {
        let mut def = TaxonomyDefinition::builtin();
        def.rules.insert(
            0,
            KeywordRule {
                kind: TransactionType::Expense,
                keywords: vec!["  Walmart Pharmacy ".into()],
                category: "Health".into(),
                sub_category: Some("Pharmacy".into()),
            },
        );
        def.aliases.push(CategoryAlias {
            kind: TransactionType::Expense,
            phrase: "Vet Bills".into(),
            category: "Pets".into(),
        });
        let taxonomy = Taxonomy::new(def).unwrap();

        let result = RuleClassifier::new(&taxonomy)
            .classify("WALMART PHARMACY #12", TransactionType::Expense);
        assert_eq!(result.category, "Health");
        assert_eq!(result.sub_category.as_deref(), Some("Pharmacy"));

        assert_eq!(
            taxonomy.reconcile("vet bills", TransactionType::Expense),
            Some("Pets")
        );
    }
}
