use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Contact types
    types.push(clean_type(LeadStatus::export_to_string()?));
    types.push(clean_type(Contact::export_to_string()?));
    types.push(clean_type(LeadRating::export_to_string()?));
    types.push(clean_type(ContactPatch::export_to_string()?));
    types.push(clean_type(ContactsResponse::export_to_string()?));

    // Duplicate review types
    types.push(clean_type(MatchType::export_to_string()?));
    types.push(clean_type(Confidence::export_to_string()?));
    types.push(clean_type(DuplicateGroup::export_to_string()?));
    types.push(clean_type(DismissedEntry::export_to_string()?));
    types.push(clean_type(ScanSummary::export_to_string()?));
    types.push(clean_type(DuplicateGroupsResponse::export_to_string()?));
    types.push(clean_type(DismissGroupRequest::export_to_string()?));

    // Merge types
    types.push(clean_type(MergeContactsRequest::export_to_string()?));
    types.push(clean_type(MergePreviewResponse::export_to_string()?));
    types.push(clean_type(AbsorbedDuplicate::export_to_string()?));
    types.push(clean_type(FailedDuplicate::export_to_string()?));
    types.push(clean_type(MergeContactsResponse::export_to_string()?));

    let output_dir = Path::new("../gui/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Some definitions import their field types (DuplicateGroup imports Contact)
    let lines: Vec<&str> = type_def.lines().collect();
    let has_import = lines
        .iter()
        .any(|line| line.trim().starts_with("import type"));

    let filtered: Vec<&str> = lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            // Keep import lines when the definition references other exported types
            if trimmed.starts_with("import type") {
                return has_import;
            }
            // Filter out the generated comment line
            !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .cloned()
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
