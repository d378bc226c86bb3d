use konjure::{
    ResourceMap, StaticResolver, Transformer, manifest::GeneratorOptions,
    mutator::SecretRefMutator, resource::Resource, transform::PodTemplateTransformer,
};

fn main() {
    divan::main();
}

fn deployments(n: usize) -> ResourceMap {
    ResourceMap::from_resources((0..n).map(|i| {
        serde_yaml::from_str::<Resource>(&format!(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web-{i}
spec:
  selector:
    matchLabels:
      app: web-{i}
  template:
    metadata:
      labels:
        app: web-{i}
    spec:
      containers:
      - name: app-{i}
        image: nginx
        env:
        - name: PASSWORD
          value: berglas://bucket/password
        - name: MODE
          value: prod
"#
        ))
        .unwrap()
    }))
    .unwrap()
}

fn resolver() -> StaticResolver {
    StaticResolver::from_iter([("berglas://bucket/password", "hunter2")])
}

#[divan::bench(args = [10, 100, 1000])]
fn substitute_in_place(bencher: divan::Bencher, n: usize) {
    bencher
        .with_inputs(|| deployments(n))
        .bench_local_values(|mut resources| {
            PodTemplateTransformer::new(SecretRefMutator::new(resolver(), None))
                .transform(&mut resources)
                .unwrap();
            resources
        });
}

#[divan::bench(args = [10, 100, 1000])]
fn generate_secrets(bencher: divan::Bencher, n: usize) {
    bencher
        .with_inputs(|| deployments(n))
        .bench_local_values(|mut resources| {
            PodTemplateTransformer::new(SecretRefMutator::new(
                resolver(),
                Some(GeneratorOptions::default()),
            ))
            .transform(&mut resources)
            .unwrap();
            resources
        });
}
