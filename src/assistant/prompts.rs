// Prompt text, fallback replies and reply clean-up

pub const CHAT_SYSTEM_INSTRUCTION: &str = "\
You are AlgoBot, an expert computer science tutor specializing in algorithms and data structures.
Your goal is to help students visualize and understand code.
- Be concise but encouraging.
- When explaining algorithms, focus on the \"why\" and \"how\".
- If the user asks for code, provide clean, commented JavaScript code.
- You are integrated into a terminal app with a code editor, a bar chart visualizer and this chat.
- The user is currently working on sorting algorithms.";

pub const ANALYSIS_SYSTEM_INSTRUCTION: &str = "\
You are a fast code analyzer.
Your job is to provide very brief, high-level feedback on complexity (Time/Space) and potential bugs.
Keep responses under 50 words unless asked otherwise.";

pub const ANALYSIS_FAILED: &str = "Analysis failed.";
pub const NO_ANALYSIS: &str = "No analysis available.";
pub const GENERATION_FAILED: &str = "// Error generating code.";
pub const CHAT_FAILED: &str = "Sorry, I encountered an error connecting to Gemini.";
pub const NO_CHAT_REPLY: &str = "I couldn't generate a response.";

pub fn analysis_prompt(code: &str) -> String {
    format!(
        "Analyze this sorting algorithm code briefly (Time/Space complexity and correctness):\n\n{code}"
    )
}

pub fn generation_prompt(request: &str) -> String {
    format!(
        "Write a JavaScript function for: {request}.
CRITICAL: The function must be named 'sort' and take an array 'data' and a 'snapshot' callback as arguments.
The 'snapshot' callback takes up to three args: (currentArray, activeIndicesArray, description).
Call 'snapshot([...data], [i, j])' whenever a comparison or swap happens so we can visualize it.
End every statement with a semicolon. Do not use classes, objects, regular expressions or async code.
Do not wrap in markdown code blocks. Just return the raw code.
Example format:
function sort(data, snapshot) {{
  // ... logic
  snapshot([...data], [i]);
}}"
    )
}

/// Drop Markdown fence lines (```` ``` ```` with or without a language tag)
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let reply = "```javascript\nfunction sort(data, snapshot) {\n  snapshot(data);\n}\n```\n";
        assert_eq!(
            strip_code_fences(reply),
            "function sort(data, snapshot) {\n  snapshot(data);\n}"
        );
        assert_eq!(strip_code_fences("  plain  "), "plain");
    }

    #[test]
    fn test_prompts_embed_input() {
        assert!(analysis_prompt("let x = 1;").ends_with("\n\nlet x = 1;"));
        let prompt = generation_prompt("heap sort");
        assert!(prompt.starts_with("Write a JavaScript function for: heap sort."));
        assert!(prompt.contains("function sort(data, snapshot) {\n"));
    }
}
