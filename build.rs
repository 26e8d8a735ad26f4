use std::path::Path;

fn main() {
    let store_path = Path::new("data/trials.json");
    let store = read_json(store_path, "STORE");
    validate_store_structure(&store);

    let lexicon_path = Path::new("data/lexicon.json");
    let lexicon = read_json(lexicon_path, "LEXICON");
    validate_lexicon_structure(&lexicon);

    set_build_dependencies();
}

fn read_json(path: &Path, label: &str) -> serde_json::Value {
    assert!(
        path.exists(),
        "\n\n{label} BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the file before building.\n",
        path.display()
    );

    let contents = std::fs::read_to_string(path).unwrap_or_else(|e| {
        panic!(
            "\n\n{label} BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            path.display()
        );
    });

    serde_json::from_str(&contents).unwrap_or_else(|e| {
        panic!(
            "\n\n{label} BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            path.display()
        );
    })
}

fn validate_store_structure(store: &serde_json::Value) {
    let trials = store
        .get("trials")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| {
            panic!(
                "\n\nSTORE BUILD ERROR: Missing 'trials' array\n\
                 The store must have a top-level 'trials' array.\n"
            );
        });

    let mut total_criteria = 0;
    for (i, trial) in trials.iter().enumerate() {
        let nct_id = trial
            .get("nct_id")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| {
                panic!("\n\nSTORE BUILD ERROR: Trial at index {i} missing 'nct_id' field\n")
            });

        assert!(
            trial.get("title").is_some(),
            "\n\nSTORE BUILD ERROR: Trial '{nct_id}' (index {i}) missing 'title' field\n"
        );

        if let Some(criteria) = trial.get("criteria").and_then(|c| c.as_array()) {
            for (j, criterion) in criteria.iter().enumerate() {
                validate_criterion(criterion, nct_id, j);
            }
            total_criteria += criteria.len();
        }
    }

    println!(
        "cargo:warning=Validated trial store: {} trials, {total_criteria} criteria",
        trials.len()
    );
}

fn validate_criterion(criterion: &serde_json::Value, nct_id: &str, index: usize) {
    let kind = criterion.get("type").and_then(|v| v.as_str());
    assert!(
        matches!(kind, Some("Inclusion" | "Exclusion")),
        "\n\nSTORE BUILD ERROR: Trial '{nct_id}' criterion {index} has invalid 'type'\n\
         Expected 'Inclusion' or 'Exclusion', got: {kind:?}\n"
    );

    assert!(
        criterion.get("text").and_then(|v| v.as_str()).is_some(),
        "\n\nSTORE BUILD ERROR: Trial '{nct_id}' criterion {index} missing 'text' field\n"
    );

    let bound = |key: &str| criterion.get(key).map(serde_json::Value::as_u64);
    for key in ["min_age", "max_age"] {
        assert!(
            !matches!(bound(key), Some(None)),
            "\n\nSTORE BUILD ERROR: Trial '{nct_id}' criterion {index} has non-integer '{key}'\n"
        );
    }
    if let (Some(Some(min)), Some(Some(max))) = (bound("min_age"), bound("max_age")) {
        assert!(
            min <= max,
            "\n\nSTORE BUILD ERROR: Trial '{nct_id}' criterion {index} has min_age above max_age\n"
        );
    }

    if let Some(code) = criterion.get("code").and_then(|v| v.as_str()) {
        assert!(
            !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '.'),
            "\n\nSTORE BUILD ERROR: Trial '{nct_id}' criterion {index} has malformed code '{code}'\n"
        );
    }
}

fn validate_lexicon_structure(lexicon: &serde_json::Value) {
    let entries = lexicon
        .get("entries")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| {
            panic!("\n\nLEXICON BUILD ERROR: Missing 'entries' array\n");
        });

    for (i, entry) in entries.iter().enumerate() {
        assert!(
            entry.get("term").and_then(|v| v.as_str()).is_some(),
            "\n\nLEXICON BUILD ERROR: Entry {i} missing 'term' field\n"
        );
        assert!(
            entry.get("codes").and_then(|v| v.as_array()).is_some(),
            "\n\nLEXICON BUILD ERROR: Entry {i} missing 'codes' array\n"
        );
    }
}

fn set_build_dependencies() {
    println!("cargo:rerun-if-changed=data/trials.json");
    println!("cargo:rerun-if-changed=data/lexicon.json");
    println!("cargo:rerun-if-changed=build.rs");
}
