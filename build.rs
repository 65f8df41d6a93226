fn main() {
    dotenvy::dotenv().ok();
    println!("cargo:rerun-if-changed=.env");
}
