/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Embedded FIX 4.4 dictionary.
//!
//! Covers the standard header and trailer, every session message, and a set
//! of application messages that exercise components, nested repeating groups
//! and embedded documents.

use crate::dictionary::{Dictionary, DictionaryBuilder};
use crate::error::DictionaryError;
use crate::schema::{
    ComponentDef, FieldDef, FieldType, GroupDef, MessageCategory, MessageDef, Member, Version,
};

const YES_NO: [(&str, &str); 2] = [("Y", "YES"), ("N", "NO")];

/// Builds the embedded FIX 4.4 dictionary.
///
/// # Errors
/// Propagates [`DictionaryError`] from the builder.
pub fn fix44() -> Result<Dictionary, DictionaryError> {
    let mut builder = DictionaryBuilder::new(Version::Fix44);
    add_fields(&mut builder);
    add_components(&mut builder);
    add_session_messages(&mut builder);
    add_application_messages(&mut builder);

    builder.header(vec![
        Member::required(8),
        Member::required(9),
        Member::required(35),
        Member::required(49),
        Member::required(56),
        Member::optional(115),
        Member::optional(128),
        Member::required(34),
        Member::optional(43),
        Member::optional(97),
        Member::required(52),
        Member::optional(122),
        Member::Group(GroupDef::new(
            627,
            "NoHops",
            628,
            vec![
                Member::optional(628),
                Member::optional(629),
                Member::optional(630),
            ],
            false,
        )),
    ]);
    builder.trailer(vec![
        Member::optional(93),
        Member::optional(89),
        Member::required(10),
    ]);

    builder.build()
}

fn add_fields(builder: &mut DictionaryBuilder) {
    use FieldType as T;

    let plain = [
        (6, "AvgPx", T::Price),
        (7, "BeginSeqNo", T::SeqNum),
        (8, "BeginString", T::String),
        (9, "BodyLength", T::Length),
        (10, "CheckSum", T::String),
        (11, "ClOrdID", T::String),
        (14, "CumQty", T::Qty),
        (16, "EndSeqNo", T::SeqNum),
        (17, "ExecID", T::String),
        (31, "LastPx", T::Price),
        (32, "LastQty", T::Qty),
        (34, "MsgSeqNum", T::SeqNum),
        (35, "MsgType", T::String),
        (36, "NewSeqNo", T::SeqNum),
        (37, "OrderID", T::String),
        (38, "OrderQty", T::Qty),
        (44, "Price", T::Price),
        (45, "RefSeqNum", T::SeqNum),
        (48, "SecurityID", T::String),
        (49, "SenderCompID", T::String),
        (52, "SendingTime", T::UtcTimestamp),
        (55, "Symbol", T::String),
        (56, "TargetCompID", T::String),
        (58, "Text", T::String),
        (60, "TransactTime", T::UtcTimestamp),
        (66, "ListID", T::String),
        (67, "ListSeqNo", T::Int),
        (68, "TotNoOrders", T::Int),
        (73, "NoOrders", T::NumInGroup),
        (89, "Signature", T::Data),
        (93, "SignatureLength", T::Length),
        (108, "HeartBtInt", T::Int),
        (112, "TestReqID", T::String),
        (115, "OnBehalfOfCompID", T::String),
        (122, "OrigSendingTime", T::UtcTimestamp),
        (128, "DeliverToCompID", T::String),
        (151, "LeavesQty", T::Qty),
        (212, "XmlDataLen", T::Length),
        (262, "MDReqID", T::String),
        (268, "NoMDEntries", T::NumInGroup),
        (270, "MDEntryPx", T::Price),
        (271, "MDEntrySize", T::Qty),
        (272, "MDEntryDate", T::UtcDateOnly),
        (273, "MDEntryTime", T::UtcTimeOnly),
        (371, "RefTagID", T::Int),
        (372, "RefMsgType", T::String),
        (448, "PartyID", T::String),
        (453, "NoPartyIDs", T::NumInGroup),
        (627, "NoHops", T::NumInGroup),
        (628, "HopCompID", T::String),
        (629, "HopSendingTime", T::UtcTimestamp),
        (630, "HopRefID", T::SeqNum),
        (789, "NextExpectedMsgSeqNum", T::SeqNum),
    ];
    for (tag, name, field_type) in plain {
        builder.add_field(FieldDef::new(tag, name, field_type));
    }

    builder
        .add_field(
            FieldDef::new(18, "ExecInst", T::MultipleCharValue).with_values([
                ("1", "NOT_HELD"),
                ("2", "WORK"),
                ("5", "HELD"),
                ("6", "PARTICIPATE_DONT_INITIATE"),
                ("E", "DO_NOT_INCREASE"),
                ("F", "DO_NOT_REDUCE"),
                ("G", "ALL_OR_NONE"),
            ]),
        )
        .add_field(
            FieldDef::new(22, "SecurityIDSource", T::String).with_values([
                ("1", "CUSIP"),
                ("2", "SEDOL"),
                ("4", "ISIN_NUMBER"),
                ("5", "RIC_CODE"),
                ("8", "EXCHANGE_SYMBOL"),
            ]),
        )
        .add_field(
            FieldDef::new(39, "OrdStatus", T::Char).with_values([
                ("0", "NEW"),
                ("1", "PARTIALLY_FILLED"),
                ("2", "FILLED"),
                ("4", "CANCELED"),
                ("8", "REJECTED"),
            ]),
        )
        .add_field(
            FieldDef::new(40, "OrdType", T::Char).with_values([
                ("1", "MARKET"),
                ("2", "LIMIT"),
                ("3", "STOP"),
                ("4", "STOP_LIMIT"),
            ]),
        )
        .add_field(FieldDef::new(43, "PossDupFlag", T::Boolean).with_values(YES_NO))
        .add_field(
            FieldDef::new(54, "Side", T::Char).with_values([
                ("1", "BUY"),
                ("2", "SELL"),
                ("3", "BUY_MINUS"),
                ("4", "SELL_PLUS"),
                ("5", "SELL_SHORT"),
                ("6", "SELL_SHORT_EXEMPT"),
            ]),
        )
        .add_field(
            FieldDef::new(59, "TimeInForce", T::Char).with_values([
                ("0", "DAY"),
                ("1", "GOOD_TILL_CANCEL"),
                ("2", "AT_THE_OPENING"),
                ("3", "IMMEDIATE_OR_CANCEL"),
                ("4", "FILL_OR_KILL"),
                ("6", "GOOD_TILL_DATE"),
            ]),
        )
        .add_field(FieldDef::new(97, "PossResend", T::Boolean).with_values(YES_NO))
        .add_field(
            FieldDef::new(98, "EncryptMethod", T::Int).with_values([
                ("0", "NONE_OTHER"),
                ("1", "PKCS"),
                ("2", "DES"),
                ("3", "PKCS_DES"),
                ("4", "PGP_DES"),
                ("5", "PGP_DES_MD5"),
                ("6", "PEM_DES_MD5"),
            ]),
        )
        .add_field(FieldDef::new(123, "GapFillFlag", T::Boolean).with_values(YES_NO))
        .add_field(FieldDef::new(141, "ResetSeqNumFlag", T::Boolean).with_values(YES_NO))
        .add_field(
            FieldDef::new(150, "ExecType", T::Char).with_values([
                ("0", "NEW"),
                ("4", "CANCELED"),
                ("5", "REPLACED"),
                ("8", "REJECTED"),
                ("F", "TRADE"),
                ("I", "ORDER_STATUS"),
            ]),
        )
        .add_field(
            FieldDef::new(213, "XmlData", T::XmlData).with_embedded_document(),
        )
        .add_field(
            FieldDef::new(269, "MDEntryType", T::Char).with_values([
                ("0", "BID"),
                ("1", "OFFER"),
                ("2", "TRADE"),
                ("4", "OPENING_PRICE"),
                ("5", "CLOSING_PRICE"),
                ("7", "TRADING_SESSION_HIGH_PRICE"),
                ("8", "TRADING_SESSION_LOW_PRICE"),
            ]),
        )
        .add_field(
            FieldDef::new(373, "SessionRejectReason", T::Int)
                .with_values([
                    ("0", "INVALID_TAG_NUMBER"),
                    ("1", "REQUIRED_TAG_MISSING"),
                    ("2", "TAG_NOT_DEFINED_FOR_THIS_MESSAGE_TYPE"),
                    ("3", "UNDEFINED_TAG"),
                    ("5", "VALUE_IS_INCORRECT"),
                    ("6", "INCORRECT_DATA_FORMAT_FOR_VALUE"),
                    ("11", "INVALID_MSGTYPE"),
                    ("16", "INCORRECT_NUMINGROUP_COUNT_FOR_REPEATING_GROUP"),
                    ("99", "OTHER"),
                ])
                .allowing_other_values(),
        )
        .add_field(
            FieldDef::new(394, "BidType", T::Int).with_values([
                ("1", "NON_DISCLOSED"),
                ("2", "DISCLOSED"),
                ("3", "NO_BIDDING_PROCESS"),
            ]),
        )
        .add_field(
            FieldDef::new(447, "PartyIDSource", T::Char).with_values([
                ("B", "BIC"),
                ("C", "GENERALLY_ACCEPTED_MARKET_PARTICIPANT_IDENTIFIER"),
                ("D", "PROPRIETARY_CUSTOM_CODE"),
                ("G", "MIC"),
            ]),
        )
        .add_field(
            FieldDef::new(452, "PartyRole", T::Int)
                .with_values([
                    ("1", "EXECUTING_FIRM"),
                    ("3", "CLIENT_ID"),
                    ("11", "ORDER_ORIGINATION_TRADER"),
                    ("12", "EXECUTING_TRADER"),
                ])
                .allowing_other_values(),
        );
}

fn add_components(builder: &mut DictionaryBuilder) {
    builder
        .add_component(ComponentDef::new(
            "Instrument",
            vec![
                Member::required(55),
                Member::optional(48),
                Member::optional(22),
            ],
        ))
        .add_component(ComponentDef::new(
            "OrderQtyData",
            vec![Member::required(38)],
        ))
        .add_component(ComponentDef::new(
            "Parties",
            vec![Member::Group(GroupDef::new(
                453,
                "NoPartyIDs",
                448,
                vec![
                    Member::optional(448),
                    Member::optional(447),
                    Member::optional(452),
                ],
                false,
            ))],
        ));
}

fn add_session_messages(builder: &mut DictionaryBuilder) {
    use MessageCategory::Admin;

    builder
        .add_message(MessageDef::new(
            "0",
            "Heartbeat",
            Admin,
            vec![Member::optional(112)],
        ))
        .add_message(MessageDef::new(
            "1",
            "TestRequest",
            Admin,
            vec![Member::required(112)],
        ))
        .add_message(MessageDef::new(
            "2",
            "ResendRequest",
            Admin,
            vec![Member::required(7), Member::required(16)],
        ))
        .add_message(MessageDef::new(
            "3",
            "Reject",
            Admin,
            vec![
                Member::required(45),
                Member::optional(371),
                Member::optional(372),
                Member::optional(373),
                Member::optional(58),
            ],
        ))
        .add_message(MessageDef::new(
            "4",
            "SequenceReset",
            Admin,
            vec![Member::optional(123), Member::required(36)],
        ))
        .add_message(MessageDef::new(
            "5",
            "Logout",
            Admin,
            vec![Member::optional(58)],
        ))
        .add_message(MessageDef::new(
            "A",
            "Logon",
            Admin,
            vec![
                Member::required(98),
                Member::required(108),
                Member::optional(141),
                Member::optional(789),
            ],
        ));
}

fn add_application_messages(builder: &mut DictionaryBuilder) {
    use MessageCategory::App;

    builder
        .add_message(MessageDef::new(
            "D",
            "NewOrderSingle",
            App,
            vec![
                Member::required(11),
                Member::component("Parties", false),
                Member::component("Instrument", true),
                Member::required(54),
                Member::required(60),
                Member::component("OrderQtyData", true),
                Member::required(40),
                Member::optional(44),
                Member::optional(59),
                Member::optional(18),
                Member::optional(58),
            ],
        ))
        .add_message(MessageDef::new(
            "8",
            "ExecutionReport",
            App,
            vec![
                Member::required(37),
                Member::optional(11),
                Member::required(17),
                Member::required(150),
                Member::required(39),
                Member::component("Instrument", true),
                Member::required(54),
                Member::optional(32),
                Member::optional(31),
                Member::required(151),
                Member::required(14),
                Member::required(6),
                Member::optional(60),
                Member::optional(58),
            ],
        ))
        .add_message(MessageDef::new(
            "E",
            "NewOrderList",
            App,
            vec![
                Member::required(66),
                Member::required(394),
                Member::required(68),
                Member::Group(GroupDef::new(
                    73,
                    "NoOrders",
                    11,
                    vec![
                        Member::required(11),
                        Member::required(67),
                        Member::component("Parties", false),
                        Member::component("Instrument", true),
                        Member::required(54),
                        Member::component("OrderQtyData", true),
                        Member::optional(40),
                        Member::optional(44),
                    ],
                    true,
                )),
            ],
        ))
        .add_message(MessageDef::new(
            "W",
            "MarketDataSnapshotFullRefresh",
            App,
            vec![
                Member::optional(262),
                Member::component("Instrument", true),
                Member::Group(GroupDef::new(
                    268,
                    "NoMDEntries",
                    269,
                    vec![
                        Member::required(269),
                        Member::optional(270),
                        Member::optional(271),
                        Member::optional(272),
                        Member::optional(273),
                    ],
                    true,
                )),
            ],
        ))
        .add_message(MessageDef::new(
            "n",
            "XMLnonFIX",
            App,
            vec![Member::optional(212), Member::optional(213)],
        ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutEntry;

    #[test]
    fn test_fix44_builds() {
        let dict = fix44().unwrap();
        assert_eq!(dict.version(), Version::Fix44);
        assert!(dict.get_message("0").unwrap().is_admin());
        assert!(!dict.get_message("D").unwrap().is_admin());
        assert_eq!(dict.get_field_by_name("Symbol").map(|f| f.tag), Some(55));
    }

    #[test]
    fn test_fix44_required_fields_exclude_header() {
        let dict = fix44().unwrap();
        let required = dict.required_fields("D").unwrap();
        assert!(required.contains(&11));
        assert!(required.contains(&55));
        assert!(required.contains(&38));
        assert!(!required.contains(&35));
        assert!(!required.contains(&453));
    }

    #[test]
    fn test_fix44_new_order_list_group() {
        let dict = fix44().unwrap();
        let group = dict.group("E", 11).unwrap();
        assert_eq!(group.count_tag, 73);
        assert!(group.required);
        let nested = group.layout.group(453).unwrap();
        assert_eq!(nested.delimiter_tag, 448);
        assert!(matches!(
            group.layout.get(55),
            Some(LayoutEntry::Field { required: true, .. })
        ));
    }

    #[test]
    fn test_fix44_header_and_trailer() {
        let dict = fix44().unwrap();
        assert!(dict.is_header_tag(49));
        assert!(dict.is_header_tag(628));
        assert!(dict.is_trailer_tag(10));
        assert!(!dict.is_header_tag(58));
        assert!(dict.get_field(213).unwrap().embedded_document);
    }
}
