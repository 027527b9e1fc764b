//! Primitive benchmarks for the keystore hot paths.
//!
//! Run with: cargo bench -p derkit-crypto

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use derkit_crypto::cipher::cipher;
use derkit_crypto::hash::digest;
use derkit_crypto::pkcs12_kdf::{bmp_password, derive, KEY_ID};
use derkit_crypto::{CipherAlgId, CipherDirection, HashAlgId};

fn bench_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest");
    let data = vec![0x5Au8; 4096];
    group.throughput(Throughput::Bytes(data.len() as u64));
    for alg in [HashAlgId::Sha1, HashAlgId::Sha256, HashAlgId::Sha512] {
        group.bench_with_input(BenchmarkId::from_parameter(alg.name()), &data, |b, data| {
            b.iter(|| digest(alg, data));
        });
    }
    group.finish();
}

fn bench_pkcs12_kdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("pkcs12_kdf");
    let password = bmp_password("test1234");
    for iterations in [1u32, 2048] {
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &iterations,
            |b, &iterations| {
                b.iter(|| derive(HashAlgId::Sha1, &password, b"saltsalt", KEY_ID, iterations, 24));
            },
        );
    }
    group.finish();
}

fn bench_cbc_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("cbc_decrypt");
    let plaintext = vec![0x42u8; 4096];
    let cases = [
        (CipherAlgId::DesEde3Cbc, vec![7u8; 24], vec![1u8; 8]),
        (CipherAlgId::Rc2Cbc { effective_bits: 40 }, vec![7u8; 5], vec![1u8; 8]),
        (CipherAlgId::Aes256Cbc, vec![7u8; 32], vec![1u8; 16]),
    ];
    group.throughput(Throughput::Bytes(plaintext.len() as u64));
    for (alg, key, iv) in cases {
        let ciphertext = cipher(CipherDirection::Encrypt, alg, &key, &iv, &plaintext).unwrap();
        group.bench_function(format!("{alg:?}"), |b| {
            b.iter(|| cipher(CipherDirection::Decrypt, alg, &key, &iv, &ciphertext).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_digest, bench_pkcs12_kdf, bench_cbc_decrypt);
criterion_main!(benches);
