fn main() {
    let filename = std::env::args().nth(1).expect("filename argument");

    let book = gnucash_parser::from_path(filename);
    dbg!(book);
}
