use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ddf_parser::{parse, serialize, FieldType, MessageSchema};
use std::fmt::Write;
use std::sync::Arc;

fn schema() -> Arc<MessageSchema> {
    let texture = MessageSchema::builder("Texture")
        .required("path", 1, FieldType::String)
        .optional("scale", 2, FieldType::Float)
        .repeated("tags", 3, FieldType::String)
        .build()
        .unwrap();

    MessageSchema::builder("TextureSet")
        .required("name", 1, FieldType::String)
        .optional("width", 2, FieldType::UInt32)
        .repeated("textures", 3, FieldType::Message(texture))
        .build()
        .unwrap()
}

fn source(textures: usize) -> String {
    let mut out = String::from("name: \"atlas\"\nwidth: 2048\n");
    for i in 0..textures {
        let _ = write!(
            out,
            "textures {{\n  path: \"tiles/tile_{}.png\"\n  scale: 0.5\n  tags: \"terrain\"\n  tags: \"layer {}\"\n}}\n",
            i, i
        );
    }
    out
}

fn parse_small_message(c: &mut Criterion) {
    let schema = schema();
    let source = source(4);

    c.bench_function("parse_small_message", |b| {
        b.iter(|| parse(black_box(&source), &schema))
    });
}

fn parse_large_message(c: &mut Criterion) {
    let schema = schema();
    let source = source(1000);

    c.bench_function("parse_large_message", |b| {
        b.iter(|| parse(black_box(&source), &schema))
    });
}

fn serialize_large_message(c: &mut Criterion) {
    let schema = schema();
    let message = parse(&source(1000), &schema).unwrap();

    c.bench_function("serialize_large_message", |b| {
        b.iter(|| serialize(black_box(&message)))
    });
}

criterion_group!(
    benches,
    parse_small_message,
    parse_large_message,
    serialize_large_message
);
criterion_main!(benches);
