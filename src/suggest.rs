//! "Did you mean" hints for mistyped commands.

/// Misspellings common enough to map directly, checked before edit distance.
const COMMON_TYPOS: &[(&str, &str)] = &[
    ("innit", "init"),
    ("inti", "init"),
    ("comit", "commit"),
    ("commmit", "commit"),
    ("checkut", "checkout"),
    ("chekout", "checkout"),
    ("brach", "branch"),
    ("branh", "branch"),
    ("statsu", "status"),
    ("stauts", "status"),
    ("ad", "add"),
    ("mege", "merge"),
    ("merg", "merge"),
    ("lgo", "log"),
];

/// Largest edit distance still considered a plausible typo.
const MAX_DISTANCE: usize = 2;

/// Pick the candidate `input` most plausibly meant to be, if any.
pub fn closest<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let lowered = input.to_lowercase();

    if let Some((_, target)) = COMMON_TYPOS.iter().find(|(typo, _)| *typo == lowered) {
        if let Some(hit) = candidates.iter().find(|c| *c == target) {
            return Some(*hit);
        }
    }

    candidates
        .iter()
        .map(|candidate| (levenshtein(&lowered, candidate), *candidate))
        .filter(|(distance, _)| *distance <= MAX_DISTANCE)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

/// Classic edit distance over chars, two-row variant.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Working forms of a subcommand, offered after it fails.
pub fn usage_examples(subcommand: &str) -> Option<&'static [&'static str]> {
    let examples: &'static [&'static str] = match subcommand {
        "init" => &["git init"],
        "add" => &["git add <file>", "git add ."],
        "commit" => &["git add <file>", "git commit -m \"message\""],
        "branch" => &["git branch <name>", "git checkout -b <name>"],
        "checkout" => &["git checkout <branch>", "git checkout -b <new-branch>"],
        "switch" => &["git switch <branch>", "git switch -c <new-branch>"],
        "merge" => &["git merge <branch>"],
        _ => return None,
    };
    Some(examples)
}
