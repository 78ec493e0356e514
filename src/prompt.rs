use crate::table::NO_DATA_SENTINEL;

/// Instruction template sent ahead of the page content. The producer is a
/// general-purpose model, so the template pins down the one output format the
/// table extractor understands and the sentinel for "nothing found".
const INSTRUCTION_TEMPLATE: &str = "\
### Instruction:
You are a precise data extraction assistant. Your ONLY task is to convert \
content into clean tables containing EXACTLY what is asked for - nothing \
more, nothing less.

### Information to Extract:
{description}

### CRITICAL RULES:
- Extract ONLY the specific information requested
- Return ONLY formatted tables - NO comments, NO explanations
- Maintain EXACT data relationships as found in source
- Return \"{sentinel}\" if requested data is not present

### Formatting Requirements:
- Start with a header row containing all column names
- Add a separator row with dashes
- Use | as the column separator, with leading and trailing |
- Every data row must have the same number of columns as the header
- Handle empty values with \"N/A\"

### Example:
| Product ID | Name | Price | Stock |
|------------|------|-------|-------|
| P001 | Gaming Laptop | $1,299.99 | 45 |
| P002 | Wireless Mouse | $29.99 | N/A |

### Context:
Text to analyze:
{content}

### Response:
";

/// Assemble the full prompt for one extraction request: fixed instructions,
/// the user's description of what to extract, and the cleaned page text.
pub fn build_prompt(description: &str, content: &str) -> String {
    INSTRUCTION_TEMPLATE
        .replace("{sentinel}", NO_DATA_SENTINEL)
        .replace("{description}", description)
        .replace("{content}", content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_description_and_content() {
        let p = build_prompt("all product prices", "Gaming Laptop\n$999");
        assert!(p.contains("all product prices"));
        assert!(p.contains("Gaming Laptop\n$999"));
    }

    #[test]
    fn names_the_sentinel() {
        let p = build_prompt("anything", "text");
        assert!(p.contains(NO_DATA_SENTINEL));
        assert!(!p.contains("{sentinel}"));
    }

    #[test]
    fn no_unfilled_placeholders() {
        let p = build_prompt("q", "c");
        assert!(!p.contains("{description}"));
        assert!(!p.contains("{content}"));
    }
}
