use std::{
    fs::{self, File},
    io::{self, Write},
};

fn main() {
    println!("cargo:rerun-if-changed=schemas");

    let mut entries = fs::read_dir("./schemas")
        .expect("failed to list schema files")
        .map(|res| res.map(|x| x.path()))
        .collect::<Result<Vec<_>, io::Error>>()
        .unwrap();
    entries.sort();

    let mut entire_string = String::new();
    entire_string.push_str("[\n");

    for (index, schema_path) in entries.iter().enumerate() {
        println!("Schema file: {:?}", schema_path);
        match fs::read_to_string(schema_path) {
            Ok(d) => {
                entire_string.push_str(&d);
                if index < (entries.len() - 1) {
                    entire_string.push(',');
                }
            }
            Err(e) => {
                panic!(
                    "Something went wrong reading the contents of the schema file: {}",
                    e
                );
            }
        }
    }

    entire_string.push_str("\n]");

    let mut f = File::create("src/all_schemas.json").expect("failed to create output file");
    f.write_all(entire_string.as_bytes())
        .expect("failed to write");
}
