use minequery_model::{AttributeType, ClassDescriptor, Model, Path, PathError};
use proptest::prelude::*;

fn genomic() -> Model {
    Model::new(
        "genomic",
        [
            ClassDescriptor::new("BioEntity")
                .with_attribute("primaryIdentifier", AttributeType::String)
                .with_reference("organism", "Organism"),
            ClassDescriptor::new("Gene")
                .extending("BioEntity")
                .with_attribute("length", AttributeType::Integer)
                .with_collection("exons", "Exon"),
            ClassDescriptor::new("Exon")
                .with_reference("gene", "Gene")
                .with_attribute("length", AttributeType::Integer),
            ClassDescriptor::new("Organism")
                .with_attribute("name", AttributeType::String)
                .with_attribute("taxonId", AttributeType::Integer),
        ],
    )
    .expect("valid model")
}

#[test]
fn resolves_attribute_end() {
    let model = genomic();
    let path = Path::resolve(&model, "Gene.organism.name").expect("resolve");
    assert_eq!(path.root_class(), "Gene");
    assert!(path.end_is_attribute());
    assert_eq!(path.end_field().map(|f| f.name.as_str()), Some("name"));
    assert_eq!(path.last_class(), "Organism");
    assert_eq!(path.second_last_class(), Some("Organism"));
    assert_eq!(path.depth(), 2);
    assert_eq!(path.to_string(), "Gene.organism.name");
}

#[test]
fn reports_linking_class_for_reference_and_collection_ends() {
    let model = genomic();

    let reference = Path::resolve(&model, "Gene.organism").expect("resolve");
    assert!(reference.end_is_reference());
    assert_eq!(reference.last_class(), "Organism");
    assert_eq!(reference.second_last_class(), Some("Gene"));

    let collection = Path::resolve(&model, "Gene.exons").expect("resolve");
    assert!(collection.end_is_collection());
    assert_eq!(collection.last_class(), "Exon");
    assert_eq!(collection.second_last_class(), Some("Gene"));
}

#[test]
fn root_path_has_no_end_field() {
    let model = genomic();
    let path = Path::resolve(&model, "Gene").expect("resolve");
    assert!(path.is_root_path());
    assert!(path.end_field().is_none());
    assert!(path.second_last_class().is_none());
    assert!(path.parent().is_none());
    assert_eq!(path.last_class(), "Gene");
}

#[test]
fn parent_drops_terminal_segment() {
    let model = genomic();
    let path = Path::resolve(&model, "Gene.exons.gene.length").expect("resolve");
    let parent = path.parent().expect("parent");
    assert_eq!(parent.as_str(), "Gene.exons.gene");
    assert_eq!(parent, Path::resolve(&model, "Gene.exons.gene").expect("resolve"));
}

#[test]
fn invalid_paths_fail_with_path_errors() {
    let model = genomic();
    assert!(matches!(
        Path::resolve(&model, ""),
        Err(PathError::EmptySegment { .. })
    ));
    assert!(matches!(
        Path::resolve(&model, "Gene..length"),
        Err(PathError::EmptySegment { .. })
    ));
    assert!(matches!(
        Path::resolve(&model, "Protein.length"),
        Err(PathError::UnknownClass { .. })
    ));
    assert!(matches!(
        Path::resolve(&model, "Gene.width"),
        Err(PathError::UnknownField { .. })
    ));
    assert!(matches!(
        Path::resolve(&model, "Gene.length.value"),
        Err(PathError::ThroughAttribute { .. })
    ));

    let message = Path::resolve(&model, "Gene.width").unwrap_err().to_string();
    assert!(message.contains("Gene.width is not a valid path"), "{message}");
}

fn segment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["organism", "exons", "gene", "name", "length", "taxonId"])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn resolved_paths_keep_class_chain_invariant(segments in prop::collection::vec(segment(), 0..5)) {
        let model = genomic();
        let mut text = String::from("Gene");
        for s in &segments {
            text.push('.');
            text.push_str(s);
        }
        if let Ok(path) = Path::resolve(&model, &text) {
            prop_assert_eq!(path.as_str(), text.as_str());
            prop_assert_eq!(path.depth(), segments.len());
            if let Some(parent) = path.parent() {
                prop_assert_eq!(parent.depth() + 1, path.depth());
                prop_assert!(!parent.end_is_attribute());
            }
        }
    }
}
