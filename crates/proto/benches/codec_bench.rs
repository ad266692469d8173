//! SFTP codec benchmarks.
//!
//! Measures marshal and decode cost for the packets that dominate a transfer.
//!
//! Run with: `cargo bench --bench codec_bench`

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use filexfer_proto::sftp::{
    Attributes, DataPacket, FileMode, NameEntry, NamePacket, Packet, RequestPacket,
    ResponsePacket, WritePacket,
};

fn test_name_packet(entries: usize) -> NamePacket {
    let mut attrs = Attributes::new();
    attrs.set_size(4096);
    attrs.set_uid_gid(1000, 1000);
    attrs.set_permissions(FileMode::from(0o100644));
    attrs.set_acmod_time(1_700_000_000, 1_700_000_000);

    NamePacket {
        entries: (0..entries)
            .map(|i| {
                let name = format!("file-{:04}.dat", i);
                let longname = format!("-rw-r--r--    1 1000     1000         4096 Nov 14 22:13 {}", name);
                NameEntry::new(name, longname, attrs.clone())
            })
            .collect(),
    }
}

/// Benchmark WRITE marshal/decode at the default data size
fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    let write = WritePacket {
        handle: Bytes::from_static(b"handle-0001"),
        offset: 1 << 20,
        data: Bytes::from(vec![0xA5u8; 32 * 1024]),
    };
    group.throughput(Throughput::Bytes(write.data.len() as u64));

    group.bench_function("marshal", |b| {
        b.iter(|| black_box(write.marshal(black_box(1))));
    });

    let frame = write.to_bytes(1);
    group.bench_function("decode", |b| {
        b.iter(|| black_box(RequestPacket::decode(black_box(&frame[..])).unwrap()));
    });

    group.finish();
}

/// Benchmark DATA decode
fn bench_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("data");
    let data = DataPacket::new(vec![0x5Au8; 32 * 1024]);
    group.throughput(Throughput::Bytes(data.data.len() as u64));

    let frame = data.to_bytes(2);
    group.bench_function("decode", |b| {
        b.iter(|| black_box(ResponsePacket::decode(black_box(&frame[..])).unwrap()));
    });

    group.finish();
}

/// Benchmark a directory listing page
fn bench_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("name");
    let name = test_name_packet(100);

    group.bench_function("marshal_100", |b| {
        b.iter(|| black_box(name.marshal(black_box(3))));
    });

    let frame = name.to_bytes(3);
    group.bench_function("decode_100", |b| {
        b.iter(|| black_box(ResponsePacket::decode(black_box(&frame[..])).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_write, bench_data, bench_name);

criterion_main!(benches);
