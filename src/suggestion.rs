// 🔮 Fuzzy Suggestion - propose a destination login for an export author
//
// Output goes into a mapping file for a human to review, so a wrong guess is
// cheap and an empty guess is always acceptable.

use crate::authors::{DestinationUser, SourceAuthor};
use crate::levenshtein;

/// Suggest a destination login for `author`, or an empty string
///
/// 1. Exact email match wins outright (first candidate in order).
/// 2. Each candidate is scored against the author login through its display
///    name, login, email and email local part; the second-smallest of those
///    distances is the candidate's effective distance.
/// 3. Only candidates within 10% of the login length qualify; later
///    candidates win ties, and distance 0 stops the scan.
/// 4. A best distance above the mean of all effective distances is rejected.
pub fn suggest(author: &SourceAuthor, candidates: &[DestinationUser]) -> String {
    if let Some(email) = author.email() {
        if let Some(user) = candidates.iter().find(|u| u.email == email) {
            return user.login.clone();
        }
    }

    let login = author.login.as_str();
    let threshold = login.chars().count() / 10;

    let mut closest = String::new();
    let mut shortest: Option<usize> = None;
    let mut distances: Vec<usize> = Vec::with_capacity(candidates.len());

    for user in candidates {
        let distance = match effective_distance(login, user) {
            Some(d) => d,
            None => continue,
        };

        if distance == 0 {
            return user.login.clone();
        }

        let beats_best = shortest.map_or(true, |best| distance <= best);
        if beats_best && distance <= threshold {
            closest = user.login.clone();
            shortest = Some(distance);
        }
        distances.push(distance);
    }

    // In case all candidates share a common pattern
    if let Some(best) = shortest {
        let mean = distances.iter().sum::<usize>() as f64 / distances.len() as f64;
        if best as f64 > mean {
            return String::new();
        }
    }

    closest
}

/// Second-smallest distance between `login` and the candidate's non-empty
/// identity fields (the only one, if just one field is set)
fn effective_distance(login: &str, user: &DestinationUser) -> Option<usize> {
    let fields = [
        user.display_name.as_str(),
        user.login.as_str(),
        user.email.as_str(),
        user.email_local_part(),
    ];

    let mut distances: Vec<usize> = fields
        .iter()
        .filter(|field| !field.is_empty())
        .map(|field| levenshtein::score(login, field))
        .collect();

    distances.sort_unstable();

    match distances.len() {
        0 => None,
        1 => Some(distances[0]),
        _ => Some(distances[1]),
    }
}

// ============================================================================
// TESTS
// ============================================================================
