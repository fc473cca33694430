#![allow(dead_code)]

use campaign_report::loader::read_csv;
use campaign_report::schema::validate;
use campaign_report::CampaignTable;

pub const HEADER: &str = "Company,Channel_Used,Campaign_Goal,Customer_Segment,Clicks,Impressions,\
ROI,Acquisition_Cost,Conversion_Rate,Date";

pub fn table_from(csv: &str) -> CampaignTable {
    let (raw, _) = read_csv(csv.as_bytes()).expect("fixture should parse");
    validate(&raw).expect("fixture should validate")
}

/// Channel A: 100 campaigns averaging 3.0 ROI. Channel B: 50 averaging 1.5.
pub fn two_channels() -> String {
    let mut csv = format!("{HEADER}\n");
    for i in 0..100 {
        let roi = if i % 2 == 0 { 2.0 } else { 4.0 };
        let month = i % 12 + 1;
        csv.push_str(&format!(
            "Acme,A,Sales,Youth,{},1000,{roi},120.5,0.08,2021-{month:02}-15\n",
            10 + i
        ));
    }
    for i in 0..50 {
        let roi = if i % 2 == 0 { 1.0 } else { 2.0 };
        let month = i % 12 + 1;
        csv.push_str(&format!(
            "Beta,B,Brand,Seniors,{},500,{roi},80,0.12,2021-{month:02}-20\n",
            5 + i
        ));
    }
    csv
}

/// One campaign per month with ROI 2.0, 2.2 and 2.5.
pub fn three_months() -> String {
    format!(
        "{HEADER}\n\
         Acme,Search,Sales,Youth,100,1000,2.0,100,0.10,2021-01-10\n\
         Acme,Email,Brand,Seniors,80,1000,2.2,150,0.05,2021-02-10\n\
         Acme,Social,Sales,Youth,120,2000,2.5,90,0.07,2021-03-10\n"
    )
}
