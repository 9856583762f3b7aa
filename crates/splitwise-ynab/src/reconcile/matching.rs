use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use crate::{ExpenseId, LedgerTransaction};

const TAG_PREFIX: &str = "sw_uuid:";

/// The tag written into every memo we create, e.g. `sw_uuid:42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationKey(pub ExpenseId);

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TAG_PREFIX}{}", self.0)
    }
}

/// Number of ASCII digits at the start of `s`.
fn leading_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

fn strip_keys(description: &str) -> String {
    let mut stripped = String::with_capacity(description.len());
    let mut rest = description;
    while let Some(start) = rest.find(TAG_PREFIX) {
        let after = &rest[start + TAG_PREFIX.len()..];
        let digits = leading_digits(after);
        if digits == 0 {
            // not one of ours, keep it verbatim
            stripped.push_str(&rest[..start + TAG_PREFIX.len()]);
        } else {
            stripped.push_str(rest[..start].trim_end_matches([',', ' ']));
        }
        rest = &after[digits..];
    }
    stripped.push_str(rest);
    stripped.trim().to_owned()
}

/// Append the correlation key to a description, replacing any key already present.
pub fn tag_description(description: &str, id: ExpenseId) -> String {
    let key = CorrelationKey(id);
    let base = strip_keys(description);
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}, {key}")
    }
}

/// The expense a memo was created for. The last key wins if there are several.
pub fn key_in_memo(memo: &str) -> Option<CorrelationKey> {
    memo.match_indices(TAG_PREFIX)
        .filter_map(|(start, _)| {
            let after = &memo[start + TAG_PREFIX.len()..];
            after[..leading_digits(after)].parse().ok()
        })
        .last()
        .map(|id| CorrelationKey(ExpenseId(id)))
}

/// Ledger transactions we created earlier, looked up by correlation key.
#[derive(Debug, Default)]
pub struct LedgerIndex {
    by_key: HashMap<CorrelationKey, LedgerTransaction>,
}

impl LedgerIndex {
    pub fn new(transactions: Vec<LedgerTransaction>) -> Self {
        let mut by_key: HashMap<CorrelationKey, LedgerTransaction> = HashMap::new();
        for transaction in transactions {
            if transaction.deleted {
                continue;
            }
            let Some(key) = transaction.memo.as_deref().and_then(key_in_memo) else {
                continue;
            };
            match by_key.entry(key) {
                Entry::Occupied(existing) => {
                    tracing::warn!(
                        "Ledger transaction {} also carries {key}, keeping {}",
                        transaction.id,
                        existing.get().id
                    );
                }
                Entry::Vacant(slot) => {
                    slot.insert(transaction);
                }
            }
        }
        LedgerIndex { by_key }
    }

    pub fn find(&self, id: ExpenseId) -> Option<&LedgerTransaction> {
        self.by_key.get(&CorrelationKey(id))
    }
}
