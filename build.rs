fn main() {
    uniffi::generate_scaffolding("src/decoplan.udl").unwrap();
}
