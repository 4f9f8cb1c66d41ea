//! The decoded event sequence must not depend on how the byte stream is cut
//! into network chunks, including cuts inside multi-byte characters.

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use llm_relay::catalog;
use llm_relay::standards::WireFormat;
use llm_relay::streaming::decode_stream;
use llm_relay::{CompletionEvent, LlmError, ProviderId, StreamDecoder, Usage};
use proptest::prelude::*;
use support::fixture;

struct Case {
    fixture: &'static str,
    format: WireFormat,
    provider: ProviderId,
    model: &'static str,
}

const CASES: &[Case] = &[
    Case {
        fixture: "anthropic/text_with_usage.sse",
        format: WireFormat::AnthropicMessages,
        provider: ProviderId::Anthropic,
        model: "claude-3-5-haiku-20241022",
    },
    Case {
        fixture: "openai/chat_with_usage.sse",
        format: WireFormat::OpenAiChat,
        provider: ProviderId::OpenAi,
        model: "gpt-4o-mini",
    },
    Case {
        fixture: "cohere/chat_v2.sse",
        format: WireFormat::CohereChat,
        provider: ProviderId::Cohere,
        model: "command-r",
    },
    Case {
        fixture: "perplexity/sonar_cumulative_usage.sse",
        format: WireFormat::OpenAiChat,
        provider: ProviderId::Perplexity,
        model: "sonar",
    },
    Case {
        fixture: "cohere/generate_done.sse",
        format: WireFormat::CohereGenerate,
        provider: ProviderId::Cohere,
        model: "command-r",
    },
];

fn decoder(case: &Case) -> StreamDecoder {
    StreamDecoder::new(
        case.format,
        case.provider,
        catalog::describe(case.provider, case.model),
    )
}

fn decode_chunks(case: &Case, chunks: &[&[u8]]) -> Vec<CompletionEvent> {
    let mut decoder = decoder(case);
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(decoder.feed(chunk));
    }
    events.extend(decoder.finish());
    events
        .into_iter()
        .collect::<Result<Vec<_>, LlmError>>()
        .expect("fixture decodes without error")
}

/// Split `bytes` at the sorted, deduplicated `cuts`.
fn split_at<'a>(bytes: &'a [u8], cuts: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();
    let mut out = Vec::new();
    let mut start = 0;
    for cut in cuts {
        out.push(&bytes[start..cut]);
        start = cut;
    }
    out.push(&bytes[start..]);
    out
}

fn assert_single_final(events: &[CompletionEvent]) {
    let finals = events.iter().filter(|e| e.is_final()).count();
    assert_eq!(finals, 1);
    assert!(events.last().is_some_and(CompletionEvent::is_final));
}

#[test]
fn every_two_way_split_matches_whole_input() {
    for case in CASES {
        let body = fixture(case.fixture);
        let bytes = body.as_bytes();
        let expected = decode_chunks(case, &[bytes]);
        assert_single_final(&expected);

        for cut in 0..=bytes.len() {
            let (head, tail) = bytes.split_at(cut);
            assert_eq!(
                decode_chunks(case, &[head, tail]),
                expected,
                "{} split at byte {cut}",
                case.fixture
            );
        }
    }
}

#[test]
fn byte_at_a_time_matches_whole_input() {
    for case in CASES {
        let body = fixture(case.fixture);
        let bytes = body.as_bytes();
        let singles: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_chunks(case, &singles), decode_chunks(case, &[bytes]));
    }
}

#[test]
fn sequence_indices_are_dense_and_final_text_is_their_concatenation() {
    for case in CASES {
        let body = fixture(case.fixture);
        let events = decode_chunks(case, &[body.as_bytes()]);
        let mut joined = String::new();
        let mut expected_index = 0;
        for event in &events {
            match event {
                CompletionEvent::Chunk { text, sequence_index } => {
                    assert_eq!(*sequence_index, expected_index);
                    expected_index += 1;
                    joined.push_str(text);
                }
                CompletionEvent::Final(response) => assert_eq!(response.text, joined),
            }
        }
        assert!(expected_index > 0, "{} produced no chunks", case.fixture);
    }
}

#[test]
fn cohere_final_uses_billed_units() {
    let case = &CASES[2];
    let events = decode_chunks(case, &[fixture(case.fixture).as_bytes()]);
    let Some(CompletionEvent::Final(response)) = events.last() else {
        panic!("missing final event");
    };
    assert_eq!(response.text, "Bonjour à tous");
    assert_eq!(response.usage, Some(Usage::new(8, 3)));
    assert_eq!(response.provider_metadata["generation_id"], "gen-1");
}

#[test]
fn cumulative_usage_does_not_cut_the_stream_short() {
    let case = &CASES[3];
    let events = decode_chunks(case, &[fixture(case.fixture).as_bytes()]);
    let Some(CompletionEvent::Final(response)) = events.last() else {
        panic!("missing final event");
    };
    assert_eq!(response.text, "The sky is blue ☀");
    assert_eq!(response.usage, Some(Usage::new(7, 4)));
    assert_eq!(response.provider_metadata["citations"][0], "https://example.org/sky");
}

#[test]
fn bare_done_line_ends_a_generate_stream() {
    let case = &CASES[4];
    let events = decode_chunks(case, &[fixture(case.fixture).as_bytes()]);
    assert_eq!(events.len(), 3);
    let Some(CompletionEvent::Final(response)) = events.last() else {
        panic!("missing final event");
    };
    assert_eq!(response.text, "Hello");
}

/// Sets its flag when dropped, marking the byte source as released.
struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Yields `head` and then never completes, like a stalled connection.
fn held_connection(
    head: &'static [u8],
) -> (
    impl futures_util::Stream<Item = Result<Vec<u8>, LlmError>> + Send + 'static,
    Arc<AtomicBool>,
) {
    let released = Arc::new(AtomicBool::new(false));
    let flag = ReleaseFlag(released.clone());
    let bytes = futures_util::stream::iter([Ok::<_, LlmError>(head.to_vec())])
        .chain(futures_util::stream::pending())
        .map(move |chunk| {
            let _held = &flag;
            chunk
        });
    (bytes, released)
}

#[tokio::test]
async fn dropping_a_stream_midway_releases_the_byte_source() {
    let (bytes, released) = held_connection(b"data: {\"text\":\"He\"}\n");
    let mut stream = decode_stream(
        bytes,
        decoder(&CASES[4]),
        Duration::from_secs(30),
        |_| panic!("no final expected"),
    );

    let first = stream.next().await.unwrap().unwrap();
    assert!(matches!(first, CompletionEvent::Chunk { ref text, .. } if text == "He"));
    assert!(!released.load(Ordering::SeqCst));

    drop(stream);
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn decode_error_releases_the_byte_source() {
    let (bytes, released) =
        held_connection(b"data: {\"error\":{\"message\":\"upstream overloaded\"}}\n");
    let mut stream = decode_stream(
        bytes,
        decoder(&CASES[1]),
        Duration::from_secs(30),
        |_| panic!("no final expected"),
    );

    let err = stream.next().await.unwrap().unwrap_err();
    assert!(err.to_string().contains("upstream overloaded"));
    assert!(stream.next().await.is_none());
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn async_driver_matches_synchronous_decoding() {
    let case = &CASES[0];
    let body = fixture(case.fixture);
    let expected = decode_chunks(case, &[body.as_bytes()]);

    let chunks: Vec<Result<Vec<u8>, LlmError>> = body
        .as_bytes()
        .chunks(7)
        .map(|c| Ok(c.to_vec()))
        .collect();
    let stream = decode_stream(
        futures_util::stream::iter(chunks),
        decoder(case),
        Duration::from_secs(5),
        |_| {},
    );
    let events: Vec<CompletionEvent> = stream.map(|e| e.unwrap()).collect().await;
    assert_eq!(events, expected);
}

#[tokio::test]
async fn async_driver_times_out_on_a_silent_connection() {
    let case = &CASES[1];
    let silent = futures_util::stream::pending::<Result<Vec<u8>, LlmError>>();
    let mut stream = decode_stream(silent, decoder(case), Duration::from_millis(20), |_| {});
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), llm_relay::ErrorKind::Stream);
    assert!(stream.next().await.is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arbitrary_chunking_is_invisible(
        which in 0..CASES.len(),
        cuts in proptest::collection::vec(any::<usize>(), 0..24),
    ) {
        let case = &CASES[which];
        let body = fixture(case.fixture);
        let bytes = body.as_bytes();
        let chunks = split_at(bytes, &cuts);
        prop_assert_eq!(decode_chunks(case, &chunks), decode_chunks(case, &[bytes]));
    }
}
