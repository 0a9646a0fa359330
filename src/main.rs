fn main() {
    byte_diff::main();
}
