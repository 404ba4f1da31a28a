// Shared by every bench target; each target compiles its own copy, so
// helpers one target skips would otherwise warn.
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with *some* **content** and `code`.\n\n- Bullet point\n  - Nested item\n- Another item\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_gfm_content(size: usize) -> String {
    let base = "## Release notes\n\n- [x] shipped ~~old~~ new parser, see www.example.com/notes\n- [ ] mail team@example.com\n\n| name | count | note |\n|:-----|------:|:----:|\n| a | 1 | *x* |\n| b | 22 | `y` |\n\nText with a footnote.[^n]\n\n[^n]: The note.\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_emphasis_heavy(size: usize) -> String {
    "a *b **c** d* _e_ ***f*** g**h**i [j](/k) ".repeat(size) + "\n"
}

#[allow(dead_code)]
pub fn generate_nested_list(depth: usize) -> String {
    "- ".repeat(depth) + "x\n"
}
