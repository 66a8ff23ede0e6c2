//! Named CSV profiles for multi-CSV runs.
//!
//! Each profile pins an instruction and a fixed column set; one structuring
//! call per document per profile produces the rows for that profile's CSV.
//! The column set never varies with the model reply, so output schemas stay
//! stable across runs.

/// Placeholder written for profile columns the model left out.
pub const MULTI_CSV_PLACEHOLDER: &str = "Not specified";

/// One CSV schema plus the instruction used to fill it.
#[derive(Debug, Clone, Copy)]
pub struct CsvProfile {
    /// File stem of the generated CSV (`<name>.csv`).
    pub name: &'static str,
    /// Human-readable one-liner for logs and summaries.
    pub description: &'static str,
    /// Extraction instruction sent ahead of the document text.
    pub instruction: &'static str,
    /// Exact column set of the generated CSV.
    pub columns: &'static [&'static str],
}

impl CsvProfile {
    /// Build the full structuring prompt for this profile.
    pub fn prompt(&self) -> String {
        format!(
            "{}\n\nReturn ONLY a JSON array of flat objects. Each object must use exactly \
             these keys: {}. Use \"{}\" for information the document does not provide. \
             Scalar values only; no markdown fences, no commentary.",
            self.instruction,
            self.columns.join(", "),
            MULTI_CSV_PLACEHOLDER,
        )
    }
}

/// The profiles generated for every document in a multi-CSV run.
pub const PROFILES: &[CsvProfile] = &[
    CsvProfile {
        name: "Resort_Details",
        description: "Resort information, policies, and contact details",
        instruction: "Extract comprehensive resort details including location, policies, \
                      contact information, and management details. Focus on resort-level \
                      information rather than specific packages.",
        columns: &[
            "Resort_Name",
            "Location",
            "Resort_Type",
            "Check_In_Time",
            "Check_Out_Time",
            "Currency",
            "Tax_Rate",
            "Service_Charge",
            "Contact_Phone",
            "Contact_Email",
            "Website",
        ],
    },
    CsvProfile {
        name: "Villas_Rooms",
        description: "Villa and room types with features and occupancy",
        instruction: "Extract all villa and room types with their specific features, \
                      occupancy limits, and amenities. Include details about private pools, \
                      room size, bed configurations, and category distinctions.",
        columns: &[
            "Villa_Type",
            "Max_Occupancy",
            "Standard_Occupancy",
            "Villa_Features",
            "Pool_Available",
            "Villa_Category",
            "Villa_Size_SQM",
            "Bedrooms",
            "Bathrooms",
        ],
    },
    CsvProfile {
        name: "Meal_Plans",
        description: "Dining options, meal plans, and restaurant information",
        instruction: "Extract all meal plan options, dining venues, restaurant details, and \
                      food-related policies. Include information about included meals, dining \
                      credits, and special dining experiences.",
        columns: &[
            "Meal_Plan_Type",
            "Included_Meals",
            "Restaurants_Available",
            "Meal_Credits_USD",
            "Special_Dining_Options",
            "Beverage_Inclusions",
            "Operating_Hours",
        ],
    },
    CsvProfile {
        name: "Transfers",
        description: "Transportation options, pricing, and transfer policies",
        instruction: "Extract all transfer and transportation options including seaplane, \
                      domestic flights, and speedboat transfers. Include pricing for different \
                      age groups, baggage allowances, and operational details.",
        columns: &[
            "Transfer_Type",
            "Adult_Price_USD",
            "Child_Price_USD",
            "Infant_Price_USD",
            "Transfer_Duration",
            "Baggage_Allowance",
            "Advance_Notice_Required",
            "Weather_Dependent",
        ],
    },
    CsvProfile {
        name: "Packages",
        description: "Package deals with comprehensive pricing and inclusions",
        instruction: "Extract ALL package combinations including different villa types, \
                      seasons, transfer options, and pricing tiers. Create one row for each \
                      unique package combination with detailed pricing and inclusions.",
        columns: &[
            "Package_Name",
            "Villa_Type",
            "Season",
            "Package_Duration",
            "Package_Price_USD",
            "Additional_Night_USD",
            "Transfer_Type",
            "Valid_From",
            "Valid_To",
            "Minimum_Stay",
            "Inclusions",
        ],
    },
    CsvProfile {
        name: "Room_Rates",
        description: "Daily rates, seasonal pricing, and occupancy-based charges",
        instruction: "Extract daily room rates, seasonal variations, additional person \
                      charges, and occupancy-based pricing. Include cancellation policies and \
                      minimum stay requirements.",
        columns: &[
            "Villa_Type",
            "Season",
            "Rate_Date_From",
            "Rate_Date_To",
            "Base_Rate_USD",
            "Additional_Person_USD",
            "Child_Rate_USD",
            "Min_Stay_Nights",
            "Cancellation_Policy",
        ],
    },
];
