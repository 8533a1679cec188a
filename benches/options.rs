use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gcu_backend::{split_options, OptionList};

/// Default options as reported for a typical target.
const TARGET_DEFAULTS: &str = "-arch=gcu300 -O3 -enable-fusion=true \
    -max-cluster-num=4 -sip-num=12 -dump-ir=false -hlir-opt-level=2";

fn padded_defaults(tokens: usize) -> String {
    (0..tokens)
        .map(|i| format!("  flag{i}=value{i}\t"))
        .collect::<Vec<_>>()
        .join("-")
}

fn bench_split(c: &mut Criterion) {
    c.bench_function("split_options/target_defaults", |b| {
        b.iter(|| split_options(black_box(TARGET_DEFAULTS), '-'))
    });

    let mut group = c.benchmark_group("split_options/padded");
    for tokens in [8usize, 64, 256] {
        let raw = padded_defaults(tokens);
        group.bench_with_input(BenchmarkId::from_parameter(tokens), &raw, |b, raw| {
            b.iter(|| split_options(black_box(raw), '-'))
        });
    }
    group.finish();
}

fn bench_argv(c: &mut Criterion) {
    let list: OptionList = {
        let toolchain = bench_support::StaticDefaults(TARGET_DEFAULTS);
        gcu_backend::build_options(&toolchain, "pavo").expect("options")
    };
    c.bench_function("option_argv/new", |b| {
        b.iter(|| black_box(&list).to_argv().expect("argv"))
    });
}

mod bench_support {
    use gcu_backend::{GraphToolchain, OptionArgv, Status};

    /// Toolchain that only answers the default-option query.
    pub struct StaticDefaults(pub &'static str);

    impl GraphToolchain for StaticDefaults {
        type Module = ();
        type Program = ();
        type Executable = ();

        fn default_options(&self, _target: &str, buf: &mut [u8]) -> Result<(), Status> {
            let bytes = self.0.as_bytes();
            if bytes.len() >= buf.len() {
                return Err(Status(1));
            }
            buf[..bytes.len()].copy_from_slice(bytes);
            buf[bytes.len()] = 0;
            Ok(())
        }

        fn create_program(&self, _module: &()) -> Result<(), Status> {
            Err(Status(1))
        }

        fn compile_program(&self, _program: &(), _options: &OptionArgv) -> Result<(), Status> {
            Err(Status(1))
        }

        fn binary_size(&self, _program: &()) -> Result<u64, Status> {
            Err(Status(1))
        }

        fn binary(&self, _program: &(), _buf: &mut [u8]) -> Result<(), Status> {
            Err(Status(1))
        }

        fn destroy_program(&self, _program: ()) -> Status {
            Status::SUCCESS
        }

        fn create_executable(&self, _binary: &[u8]) -> Result<(), Status> {
            Err(Status(1))
        }
    }
}

criterion_group!(benches, bench_split, bench_argv);
criterion_main!(benches);
