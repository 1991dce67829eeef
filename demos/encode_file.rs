use huffpuff::{FrequencyTable, HuffmanTree, SerializableCodeTable};
use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};

fn main() {
    let fp = env::args()
        .nth(1)
        .expect("Please provide path to input file as first argument.");
    let huff_path = format!("{}.huff", fp);
    let puff_path = format!("{}.puff", fp);

    // encode scope - save to file
    {
        let input = BufReader::new(File::open(&fp).expect("First argument was not a valid filepath."));
        let output = BufWriter::new(File::create(&huff_path).unwrap());
        huffpuff::encode(input, output).unwrap();
    }

    // code table, for a look at what the encoder used
    {
        let input_bytes = fs::read(&fp).unwrap();
        let table = FrequencyTable::from_bytes(&input_bytes);
        let codes = HuffmanTree::build(&table).unwrap().code_table();

        let data = rmp_serde::to_vec(&SerializableCodeTable::from(&codes)).unwrap();
        fs::write(format!("{}.codes.mp", fp), data).unwrap();

        println!(
            "{} bytes -> {} payload bits over {} codes",
            input_bytes.len(),
            codes.encoded_bits(&table),
            codes.len()
        );
    }

    // decode scope - read from file
    {
        let input = BufReader::new(File::open(&huff_path).unwrap());
        let output = BufWriter::new(File::create(&puff_path).unwrap());
        huffpuff::decode(input, output).unwrap();
    }

    println!("wrote {} and {}", huff_path, puff_path);
}
