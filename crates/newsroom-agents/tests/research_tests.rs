use newsroom_agents::ResearchAgent;
use newsroom_core::{ChunkingConfig, Error, SourceDocument};
use newsroom_embed::HashingEmbedder;
use newsroom_retrieval::Retriever;

fn agent(k: usize) -> ResearchAgent<HashingEmbedder> {
    let retriever = Retriever::new(HashingEmbedder::new(128), ChunkingConfig { chunk_size: 60, overlap: 10 }, 1).unwrap();
    ResearchAgent::new(retriever, k).unwrap()
}

fn docs() -> Vec<SourceDocument> {
    vec![
        SourceDocument::new("cats", "Cats are mammals that purr. Cats sleep a lot during the day."),
        SourceDocument::new("rockets", "Rockets burn fuel to reach orbit. Rocket engines are loud."),
    ]
}

#[test]
fn gather_bundles_top_passages_in_rank_order() {
    let research = agent(2);
    let bundle = research.gather("cats purr", &docs()).expect("gather");

    assert_eq!(bundle.topic, "cats purr");
    assert_eq!(bundle.chunk_ids.len(), 2);
    assert!(bundle.chunk_ids[0].starts_with("cats:"));
    assert!(bundle.text.starts_with("Cats are mammals"));
    assert_eq!(bundle.text.split("\n\n").count(), 2);
}

#[test]
fn gather_from_index_matches_gather() {
    let research = agent(3);
    let index = research.build(&docs()).unwrap();
    let from_index = research.gather_from_index("rocket fuel", &index).unwrap();
    let direct = research.gather("rocket fuel", &docs()).unwrap();
    assert_eq!(from_index, direct);
    assert_eq!(research.k(), 3);
}

#[test]
fn gather_without_text_has_no_relevant_context() {
    let research = agent(4);
    let err = research.gather("cats", &[]).unwrap_err();
    assert!(matches!(err, Error::NoRelevantContext(ref t) if t == "cats"));

    let blank = research.gather("cats", &[SourceDocument::new("blank", "")]).unwrap_err();
    assert!(matches!(blank, Error::NoRelevantContext(_)));
}

#[test]
fn zero_k_is_rejected() {
    let retriever = Retriever::new(HashingEmbedder::new(8), ChunkingConfig::default(), 1).unwrap();
    assert!(matches!(ResearchAgent::new(retriever, 0), Err(Error::InvalidParameter(_))));
}
