//! Chat Memory Benchmarks
//!
//! Measures performance of the conversation store and request encoding:
//! - Appending to a conversation, bounded and unbounded
//! - Retrieving recent history
//! - Chat completion request serialization
//! - SSE stream decoding

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use bytes::Bytes;
use futures::{executor::block_on, stream, TryStreamExt};

use relay_core::llm::sse::content_stream;
use relay_core::llm::{ChatCompletionRequest, ChatOptions, Message, Prompt};
use relay_core::ChatMemory;

fn filled_memory(chat_id: &str, count: usize) -> ChatMemory {
    let memory = ChatMemory::new();
    for i in 0..count {
        memory.append(chat_id, Message::user(format!("Message {}", i)));
    }
    memory
}

/// Benchmark append operations
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_append");

    group.bench_function("append_single", |b| {
        let memory = ChatMemory::new();
        b.iter(|| memory.append(black_box("chat"), Message::user("Hello, world!")))
    });

    group.bench_function("append_exchange", |b| {
        let memory = ChatMemory::new();
        b.iter(|| {
            memory.append_all(
                black_box("chat"),
                [Message::user("Hello"), Message::assistant("Hi there")],
            )
        })
    });

    // Bounded stores evict from the front on every append
    for max in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("append_bounded", max), max, |b, &max| {
            let memory = ChatMemory::with_max_messages(max);
            b.iter(|| memory.append(black_box("chat"), Message::user("Hello")))
        });
    }

    // Many distinct conversations
    for count in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("append_many_chats", count),
            count,
            |b, &count| {
                b.iter(|| {
                    let memory = ChatMemory::new();
                    for i in 0..count {
                        memory.append(&format!("chat-{}", i), Message::user("Hello"));
                    }
                    black_box(memory)
                })
            },
        );
    }

    group.finish();
}

/// Benchmark history retrieval
fn bench_retrieve(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_retrieve");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("retrieve_all", size), size, |b, &size| {
            let memory = filled_memory("chat", size);
            b.iter(|| memory.retrieve(black_box("chat"), size))
        });
    }

    group.bench_function("retrieve_last_10_of_1000", |b| {
        let memory = filled_memory("chat", 1000);
        b.iter(|| memory.retrieve(black_box("chat"), 10))
    });

    group.bench_function("retrieve_unknown", |b| {
        let memory = filled_memory("chat", 100);
        b.iter(|| memory.retrieve(black_box("missing"), 100))
    });

    group.finish();
}

/// Benchmark chat completion request encoding
fn bench_request_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_encoding");

    for count in [10, 50, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("serialize_with_history", count),
            count,
            |b, &count| {
                let mut messages = vec![Message::system("You are a helpful assistant.")];
                for i in 0..count {
                    messages.push(Message::user(format!("Message {}", i)));
                }
                let prompt = Prompt::new(messages, ChatOptions::default());
                let request = ChatCompletionRequest::from_prompt(prompt, "gpt-4o-mini", false);

                b.iter(|| serde_json::to_string(black_box(&request)).unwrap())
            },
        );
    }

    group.finish();
}

/// Benchmark SSE decoding
fn bench_sse_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("sse_decoding");

    for count in [10, 100, 1000].iter() {
        let mut body = String::new();
        for i in 0..*count {
            body.push_str(&format!(
                "data: {{\"choices\":[{{\"delta\":{{\"content\":\"token {}\"}}}}]}}\n\n",
                i
            ));
        }
        body.push_str("data: [DONE]\n\n");

        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::new("decode_events", count), &body, |b, body| {
            b.iter(|| {
                // Feed in small slices to exercise line buffering
                let parts: Vec<Result<Bytes, std::io::Error>> = body
                    .as_bytes()
                    .chunks(64)
                    .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
                    .collect();
                let chunks: Vec<String> =
                    block_on(content_stream(stream::iter(parts)).try_collect()).unwrap();
                black_box(chunks)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_append,
    bench_retrieve,
    bench_request_encoding,
    bench_sse_decoding
);
criterion_main!(benches);
