/// A typical tutoring reply, covering every markdown construct the
/// plaintext converter handles.
pub fn markdown_fixture() -> &'static str {
    return r#"
# Loops in Rust

Here is **bold**, *italic* and `inline` code.

- first item
* second item

See [the book](https://doc.rust-lang.org/book/).

```rust
let x = 2 * 3 * 4;
println!("**not bold**");
```



Done!
"#
    .trim();
}

/// The shape of a Messages `attributedBody` column: an archived
/// NSAttributedString with the message text stored as a length prefixed
/// string somewhere in the middle.
pub fn attributed_body_fixture(text: &str) -> Vec<u8> {
    let mut blob = vec![0x04, 0x0b];
    blob.extend_from_slice(b"streamtyped");
    blob.extend_from_slice(&[0x81, 0xe8, 0x03, 0x84, 0x01, 0x40, 0x84, 0x84, 0x84]);
    blob.extend_from_slice(b"\x12NSAttributedString");
    blob.extend_from_slice(&[0x00, 0x84, 0x84, 0x08]);
    blob.extend_from_slice(b"NSObject");
    blob.extend_from_slice(&[0x00, 0x85, 0x92, 0x84, 0x84, 0x84]);
    blob.extend_from_slice(b"\x08NSString");
    blob.extend_from_slice(&[0x01, 0x94, 0x84, 0x01, 0x2b]);
    blob.push(text.len() as u8);
    blob.extend_from_slice(text.as_bytes());
    blob.extend_from_slice(&[0x86, 0x84, 0x02, 0x69, 0x49, 0x01, 0x86, 0x92, 0x84]);
    return blob;
}
