use crate::categorize::available_categories;

pub fn categorize(title: &str, body: &str) -> String {
    let list = available_categories()
        .iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"Analyze this tech content and assign it to the most relevant categories. Return only a JSON array of category names.

Title: "{title}"
Description: "{body}"

Available Categories:
{list}

Rules:
- Return 1-3 most relevant categories
- Base decision on content keywords and context
- Return only JSON array like: ["AI & Machine Learning", "Software Development"]

Categories:"#
    )
}

pub fn summary(title: &str, content: &str) -> String {
    format!(
        r#"You're a tech-savvy content creator who breaks down tech news in a natural, conversational way. Analyze this tech article and give me the breakdown:

Title: "{title}"
Content: "{content}"

Start with one compelling sentence about what's happening. Then cover, using plain bullet points and no markdown headings:

The Main Story
What's actually happening here and why should anyone care?

Key Players
- Who's behind this tech? Any big companies or people involved?

The Tech Breakdown
- What exactly does this thing do and how is it different from what we already have?
- Is this actually innovative or just hype?

Market Reality Check
- How does this stack up against the competition? Any red flags or major wins?

Why This Matters
- What problems is this solving, and who is it for?

Bottom Line
Give an honest take and rate it out of 10. Skip any section where there isn't enough info."#
    )
}

pub fn five_w_one_h(title: &str, content: &str) -> String {
    format!(
        r#"Break down this tech article using the 5W1H framework. Answer each question in one to three plain sentences, and write "Not mentioned" when the article does not say.

Title: "{title}"
Content: "{content}"

Who: the people, companies or groups involved.
What: what happened or what was announced.
When: timing, release dates or deadlines.
Where: markets, regions or platforms affected.
Why: the motivation or problem being addressed.
How: how it works or how it will be rolled out."#
    )
}

pub fn comparison(title: &str, content: &str) -> String {
    format!(
        r#"Compare the product, company or technology in this article against its closest competitors in the current market.

Title: "{title}"
Content: "{content}"

Cover:
- The main competitors and how they differ.
- Pricing and positioning, if known.
- Strengths and weaknesses relative to the market.
- Who is likely to win or lose from this.

Keep it factual and concise, use plain bullet points, and say when the article lacks the information needed."#
    )
}
