//! Analysis prompt sent alongside each chart
//!
//! The prompt depends on the ticker symbol only, so two requests for the same
//! ticker carry identical text.

/// Key holding the short recommendation label in the model's JSON reply
pub const ACTION_KEY: &str = "action";

/// Key holding the narrative explanation in the model's JSON reply
pub const JUSTIFICATION_KEY: &str = "justification";

/// Build the technical-analysis prompt for `ticker`
pub fn analysis_prompt(ticker: &str) -> String {
    format!(
        "You are a Stock Trader specializing in Technical Analysis at a top financial institution.

Analyze the stock chart for {ticker} based on its candlestick chart and the displayed technical indicators and include the company name (not just the ticker symbol).

Provide a detailed technical analysis that includes the following:
1. Identification of key candlestick patterns (e.g., doji, hammer, engulfing).
2. Description of recent trend direction (uptrend, downtrend, consolidation).
3. Explanation of how each displayed indicator (e.g., SMA, EMA, Bollinger Bands, VWAP) supports or contradicts the trend.
4. Commentary on volume behavior and whether it confirms or diverges from the price movement.
5. Mention any potential breakout or reversal zones.
6. Risk assessment: highlight any conflicting signals or uncertainty factors.

Base your recommendation only on the chart and these factors.

Return your output as a JSON object with exactly two keys:
- '{ACTION_KEY}': recommendation such as 'Strong Buy', 'Buy', 'Hold', 'Sell' or 'Strong Sell'.
- '{JUSTIFICATION_KEY}': a detailed multi-paragraph explanation.

Write the justification as if preparing a research note for a senior portfolio manager.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_ticker_and_keys() {
        let prompt = analysis_prompt("NVDA");
        assert!(prompt.contains("stock chart for NVDA"));
        assert!(prompt.contains("company name"));
        assert!(prompt.contains("exactly two keys"));
        assert!(prompt.contains("'action'"));
        assert!(prompt.contains("'justification'"));
        assert!(prompt.contains("research note for a senior portfolio manager"));
    }

    #[test]
    fn test_prompt_asks_for_all_factors() {
        let prompt = analysis_prompt("AAPL");
        for item in 1..=6 {
            assert!(prompt.contains(&format!("\n{item}. ")), "missing item {item}");
        }
        assert!(prompt.contains("volume behavior"));
        assert!(prompt.contains("breakout or reversal"));
    }

    #[test]
    fn test_prompt_is_deterministic_per_ticker() {
        assert_eq!(analysis_prompt("MSFT"), analysis_prompt("MSFT"));
        assert_ne!(analysis_prompt("MSFT"), analysis_prompt("GOOG"));
    }
}
