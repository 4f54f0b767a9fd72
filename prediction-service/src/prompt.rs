//! Prompt construction and completion cleanup for `/predict`.

/// Wraps the user's query in the fixed four-section answer format.
pub fn build_prompt(query: &str) -> String {
    format!(
        "Based on this query: {query}

        Provide medical advice in this exact format:

        ### Key Suggestions for Self-Care
        - Stay hydrated with warm fluids
        - Use honey for cough (adults and children >1 year)

        ### Lifestyle Modifications
        - Use a humidifier in bedroom
        - Avoid irritants and allergens

        ### When to Seek Medical Attention
        - If symptoms worsen or persist >7 days
        - If experiencing severe symptoms

        ### Warnings & Precautions
        - Note about OTC medication safety
        - When to consult healthcare provider

        Keep responses evidence-based and practical.
        Use proper Markdown line breaks between sections."
    )
}

/// Drops reasoning tag lines like `<think>` and `</think>`: any line whose
/// trimmed text starts with `<` or ends with `>`.
pub fn clean_response(completion: &str) -> String {
    completion
        .lines()
        .filter(|line| {
            let line = line.trim();
            !line.starts_with('<') && !line.ends_with('>')
        })
        .collect::<Vec<_>>()
        .join("\n")
}
